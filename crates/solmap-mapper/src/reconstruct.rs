// SPDX-License-Identifier: AGPL-3.0

//! Solidity source reconstruction from AST nodes
//!
//! Used when the literal source text is not available. The output is
//! equivalent Solidity (or Yul), not the original formatting: comments are
//! lost and whitespace is normalised.

use serde_json::Value;

use crate::ast::{Node, NodeType};

/// Render `node` back into source text.
///
/// Objects without a `nodeType` render as the empty string. Unknown node
/// types render as `<unhandled Tag>` so one unsupported construct never
/// aborts a mapping.
pub fn unparse(node: Node<'_>) -> String {
    let Some(node_type) = node.node_type() else {
        return String::new();
    };

    match node_type {
        // expressions
        NodeType::Literal => literal(node),
        NodeType::Identifier | NodeType::IdentifierPath => node.str_field("name").to_string(),
        NodeType::BinaryOperation => format!(
            "({} {} {})",
            field(node, "leftExpression"),
            node.str_field("operator"),
            field(node, "rightExpression")
        ),
        NodeType::UnaryOperation => unary_operation(node),
        NodeType::Assignment => {
            let operator = match node.str_field("operator") {
                "" => "=",
                op => op,
            };
            format!(
                "{} {} {}",
                field(node, "leftHandSide"),
                operator,
                field(node, "rightHandSide")
            )
        }
        NodeType::Conditional => format!(
            "{} ? {} : {}",
            field(node, "condition"),
            field(node, "trueExpression"),
            field(node, "falseExpression")
        ),
        NodeType::FunctionCall => function_call(node),
        NodeType::FunctionCallOptions => {
            let names = strings(node, "names");
            let options: Vec<String> = node.children("options").into_iter().map(unparse).collect();
            let pairs: Vec<String> = names
                .iter()
                .zip(&options)
                .map(|(name, option)| format!("{}: {}", name, option))
                .collect();
            format!("{}{{{}}}", field(node, "expression"), pairs.join(", "))
        }
        NodeType::MemberAccess => format!(
            "{}.{}",
            field(node, "expression"),
            node.str_field("memberName")
        ),
        NodeType::IndexAccess => format!(
            "{}[{}]",
            field(node, "baseExpression"),
            field(node, "indexExpression")
        ),
        NodeType::IndexRangeAccess => format!(
            "{}[{}:{}]",
            field(node, "baseExpression"),
            field(node, "startExpression"),
            field(node, "endExpression")
        ),
        NodeType::TupleExpression => {
            let components = raw_list(node, "components").join(", ");
            if node.bool_field("isInlineArray") == Some(true) {
                format!("[{}]", components)
            } else {
                format!("({})", components)
            }
        }
        NodeType::NewExpression => format!("new {}", field(node, "typeName")),
        NodeType::ElementaryTypeNameExpression => {
            let type_name = match node.get("typeName") {
                Some(Value::String(name)) => name.clone(),
                Some(value) => unparse_value(value),
                None => String::new(),
            };
            match node.get("argument") {
                Some(argument) => format!("{}({})", type_name, unparse_value(argument)),
                None => type_name,
            }
        }
        NodeType::TypeDescriptions => node.str_field("typeString").to_string(),

        // statements
        NodeType::Block => block(node, "statements"),
        NodeType::UncheckedBlock => format!("unchecked {}", block(node, "statements")),
        NodeType::ExpressionStatement => format!("{};", field(node, "expression")),
        NodeType::VariableDeclarationStatement => variable_declaration_statement(node),
        NodeType::IfStatement => {
            let mut text = format!(
                "if ({}) {}",
                field(node, "condition"),
                field(node, "trueBody")
            );
            if let Some(false_body) = node.get("falseBody") {
                text.push_str(&format!(" else {}", unparse_value(false_body)));
            }
            text
        }
        NodeType::WhileStatement => format!(
            "while ({}) {}",
            field(node, "condition"),
            field(node, "body")
        ),
        NodeType::DoWhileStatement => format!(
            "do {} while ({});",
            field(node, "body"),
            field(node, "condition")
        ),
        NodeType::ForStatement => {
            let init = node
                .child("initializationExpression")
                .map(unparse)
                .unwrap_or_else(|| ";".to_string());
            let step = field(node, "loopExpression");
            format!(
                "for ({} {}; {}) {}",
                init,
                field(node, "condition"),
                step.trim_end_matches(';'),
                field(node, "body")
            )
        }
        NodeType::Return => match node.get("expression") {
            Some(expression) => format!("return {};", unparse_value(expression)),
            None => "return;".to_string(),
        },
        NodeType::EmitStatement => format!("emit {};", field(node, "eventCall")),
        NodeType::RevertStatement => {
            if let Some(call) = node.child("errorCall") {
                format!("revert {};", unparse(call))
            } else if let Some(expression) = node.get("expression") {
                format!("revert({});", unparse_value(expression))
            } else {
                "revert();".to_string()
            }
        }
        NodeType::Break => "break;".to_string(),
        NodeType::Continue => "continue;".to_string(),
        NodeType::PlaceholderStatement => "_;".to_string(),
        NodeType::TryStatement => try_statement(node),
        NodeType::TryCatchClause => {
            let parameters = field(node, "parameters");
            let body = field(node, "block");
            match (node.str_field("errorName"), parameters.is_empty()) {
                ("", true) => format!("catch {}", body),
                (name, _) => format!("catch {}({}) {}", name, parameters, body),
            }
        }
        NodeType::InlineAssembly => inline_assembly(node),

        // declarations
        NodeType::SourceUnit => list(node, "nodes", "\n"),
        NodeType::PragmaDirective => {
            let literals = strings(node, "literals");
            match literals.split_first() {
                Some((first, rest)) if rest.is_empty() => format!("pragma {};", first),
                Some((first, rest)) => format!("pragma {} {};", first, rest.concat()),
                None => "pragma;".to_string(),
            }
        }
        NodeType::ImportDirective => import_directive(node),
        NodeType::ContractDefinition => contract_definition(node),
        NodeType::InheritanceSpecifier => with_arguments(field(node, "baseName"), node),
        NodeType::UsingForDirective => using_for_directive(node),
        NodeType::StructDefinition => {
            let members: Vec<String> = node
                .children("members")
                .into_iter()
                .map(|member| format!("{};", unparse(member)))
                .collect();
            format!("struct {} {{ {} }}", node.str_field("name"), members.join(" "))
        }
        NodeType::EnumDefinition => format!(
            "enum {} {{ {} }}",
            node.str_field("name"),
            list(node, "members", ", ")
        ),
        NodeType::EnumValue => node.str_field("name").to_string(),
        NodeType::EventDefinition => {
            let anonymous = if node.bool_field("anonymous") == Some(true) {
                " anonymous"
            } else {
                ""
            };
            format!(
                "event {}({}){};",
                node.str_field("name"),
                field(node, "parameters"),
                anonymous
            )
        }
        NodeType::ErrorDefinition => format!(
            "error {}({});",
            node.str_field("name"),
            field(node, "parameters")
        ),
        NodeType::UserDefinedValueTypeDefinition => format!(
            "type {} is {};",
            node.str_field("name"),
            field(node, "underlyingType")
        ),
        NodeType::FunctionDefinition => function_definition(node),
        NodeType::ModifierDefinition => {
            let mut header = vec![format!(
                "modifier {}({})",
                node.str_field("name"),
                field(node, "parameters")
            )];
            if node.bool_field("virtual") == Some(true) {
                header.push("virtual".to_string());
            }
            push_nonempty(&mut header, field(node, "overrides"));
            with_body(header, node)
        }
        NodeType::ModifierInvocation => with_arguments(field(node, "modifierName"), node),
        NodeType::OverrideSpecifier => {
            let overrides = list(node, "overrides", ", ");
            if overrides.is_empty() {
                "override".to_string()
            } else {
                format!("override({})", overrides)
            }
        }
        NodeType::ParameterList => list(node, "parameters", ", "),
        NodeType::VariableDeclaration => variable_declaration(node),
        NodeType::StructuredDocumentation => {
            let text: Vec<String> = node
                .str_field("text")
                .lines()
                .map(|line| format!(" * {}", line.trim()))
                .collect();
            format!("/**\n{}\n */", text.join("\n"))
        }
        NodeType::StorageLayoutSpecifier => {
            format!("layout at {}", field(node, "baseSlotExpression"))
        }

        // type names
        NodeType::ElementaryTypeName => {
            let name = node.str_field("name");
            if name == "address" && node.str_field("stateMutability") == "payable" {
                "address payable".to_string()
            } else {
                name.to_string()
            }
        }
        NodeType::UserDefinedTypeName => match node.child("pathNode") {
            Some(path) => unparse(path),
            None => node.str_field("name").to_string(),
        },
        NodeType::ArrayTypeName => format!(
            "{}[{}]",
            field(node, "baseType"),
            field(node, "length")
        ),
        NodeType::Mapping => {
            let key = words(&[field(node, "keyType"), node.str_field("keyName").to_string()]);
            let value = words(&[
                field(node, "valueType"),
                node.str_field("valueName").to_string(),
            ]);
            format!("mapping({} => {})", key, value)
        }
        NodeType::FunctionTypeName => {
            let mut parts = vec![format!("function({})", field(node, "parameterTypes"))];
            match node.str_field("visibility") {
                "" | "internal" => {}
                visibility => parts.push(visibility.to_string()),
            }
            match node.str_field("stateMutability") {
                "" | "nonpayable" => {}
                mutability => parts.push(mutability.to_string()),
            }
            let returns = field(node, "returnParameterTypes");
            if !returns.is_empty() {
                parts.push(format!("returns ({})", returns));
            }
            parts.join(" ")
        }

        // yul
        NodeType::YulBlock => block(node, "statements"),
        NodeType::YulIdentifier | NodeType::YulTypedName => node.str_field("name").to_string(),
        NodeType::YulLiteral => match (node.str_field("kind"), node.get("value")) {
            ("string", Some(_)) => format!("\"{}\"", node.str_field("value")),
            (_, Some(_)) => node.str_field("value").to_string(),
            (_, None) => format!("hex\"{}\"", node.str_field("hexValue")),
        },
        NodeType::YulLiteralValue => match node.str_field("kind") {
            "string" => format!("\"{}\"", node.str_field("value")),
            _ => node.str_field("value").to_string(),
        },
        NodeType::YulLiteralHexValue => match node.str_field("kind") {
            "number" => format!("0x{}", node.str_field("value")),
            _ => format!("hex\"{}\"", node.str_field("value")),
        },
        NodeType::YulAssignment => format!(
            "{} := {}",
            list(node, "variableNames", ", "),
            field(node, "value")
        ),
        NodeType::YulVariableDeclaration => {
            let names = list(node, "variables", ", ");
            match node.get("value") {
                Some(value) => format!("let {} := {}", names, unparse_value(value)),
                None => format!("let {}", names),
            }
        }
        NodeType::YulFunctionCall => format!(
            "{}({})",
            field(node, "functionName"),
            list(node, "arguments", ", ")
        ),
        NodeType::YulExpressionStatement => field(node, "expression"),
        NodeType::YulIf => format!("if {} {}", field(node, "condition"), field(node, "body")),
        NodeType::YulSwitch => {
            let cases: Vec<String> = node.children("cases").into_iter().map(unparse).collect();
            words(&[
                format!("switch {}", field(node, "expression")),
                cases.join(" "),
            ])
        }
        NodeType::YulCase => match node.get("value") {
            Some(Value::String(label)) if label == "default" => {
                format!("default {}", field(node, "body"))
            }
            _ => format!("case {} {}", field(node, "value"), field(node, "body")),
        },
        NodeType::YulForLoop => format!(
            "for {} {} {} {}",
            field(node, "pre"),
            field(node, "condition"),
            field(node, "post"),
            field(node, "body")
        ),
        NodeType::YulFunctionDefinition => {
            let mut header = format!(
                "function {}({})",
                node.str_field("name"),
                list(node, "parameters", ", ")
            );
            let returns = list(node, "returnVariables", ", ");
            if !returns.is_empty() {
                header.push_str(&format!(" -> {}", returns));
            }
            format!("{} {}", header, field(node, "body"))
        }
        NodeType::YulBreak => "break".to_string(),
        NodeType::YulContinue => "continue".to_string(),
        NodeType::YulLeave => "leave".to_string(),

        NodeType::Unknown(tag) => format!("<unhandled {}>", tag),
    }
}

/// Render any JSON value: objects as nodes, arrays as comma-separated lists,
/// everything else as the empty string.
pub fn unparse_value(value: &Value) -> String {
    match value {
        Value::Object(_) => Node::new(value).map(unparse).unwrap_or_default(),
        Value::Array(items) => items
            .iter()
            .map(unparse_value)
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

fn field(node: Node<'_>, key: &str) -> String {
    node.get(key).map(unparse_value).unwrap_or_default()
}

fn list(node: Node<'_>, key: &str, separator: &str) -> String {
    node.children(key)
        .into_iter()
        .map(unparse)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Like [`list`] but keeps `null` items as empty slots.
fn raw_list(node: Node<'_>, key: &str) -> Vec<String> {
    node.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().map(unparse_value).collect())
        .unwrap_or_default()
}

fn strings<'a>(node: Node<'a>, key: &str) -> Vec<&'a str> {
    node.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn words(parts: &[String]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_nonempty(parts: &mut Vec<String>, part: String) {
    if !part.is_empty() {
        parts.push(part);
    }
}

fn block(node: Node<'_>, key: &str) -> String {
    let statements: Vec<String> = node.children(key).into_iter().map(unparse).collect();
    if statements.is_empty() {
        "{ }".to_string()
    } else {
        format!("{{\n{}\n}}", statements.join("\n"))
    }
}

/// `name` or `name(args)`. A missing argument list renders without parentheses.
fn with_arguments(name: String, node: Node<'_>) -> String {
    match node.get("arguments") {
        Some(arguments) => format!("{}({})", name, unparse_value(arguments)),
        None => name,
    }
}

fn with_body(header: Vec<String>, node: Node<'_>) -> String {
    match node.get("body") {
        Some(body) => format!("{} {}", header.join(" "), unparse_value(body)),
        None => format!("{};", header.join(" ")),
    }
}

fn literal(node: Node<'_>) -> String {
    let value = match node.get("value") {
        Some(Value::String(value)) => value.clone(),
        Some(Value::Bool(value)) => value.to_string(),
        Some(Value::Number(value)) => value.to_string(),
        _ => String::new(),
    };

    let text = match node.str_field("kind") {
        "string" => format!("\"{}\"", value),
        "unicodeString" => format!("unicode\"{}\"", value),
        "hexString" => format!("hex\"{}\"", node.str_field("hexValue")),
        _ => value,
    };

    match node.str_field("subdenomination") {
        "" => text,
        unit => format!("{} {}", text, unit),
    }
}

fn unary_operation(node: Node<'_>) -> String {
    let operator = node.str_field("operator");
    let operand = field(node, "subExpression");
    if node.bool_field("prefix").unwrap_or(true) {
        if operator == "delete" {
            format!("delete {}", operand)
        } else {
            format!("{}{}", operator, operand)
        }
    } else {
        format!("{}{}", operand, operator)
    }
}

fn function_call(node: Node<'_>) -> String {
    let callee = field(node, "expression");
    let arguments: Vec<String> = node.children("arguments").into_iter().map(unparse).collect();
    let names = strings(node, "names");

    if !names.is_empty() && names.len() == arguments.len() {
        let pairs: Vec<String> = names
            .iter()
            .zip(&arguments)
            .map(|(name, argument)| format!("{}: {}", name, argument))
            .collect();
        format!("{}({{{}}})", callee, pairs.join(", "))
    } else {
        format!("{}({})", callee, arguments.join(", "))
    }
}

fn variable_declaration_statement(node: Node<'_>) -> String {
    let declarations = raw_list(node, "declarations");
    let target = match declarations.as_slice() {
        [single] => single.clone(),
        many => format!("({})", many.join(", ")),
    };

    match node.get("initialValue") {
        Some(value) => format!("{} = {};", target, unparse_value(value)),
        None => format!("{};", target),
    }
}

fn variable_declaration(node: Node<'_>) -> String {
    let mut parts = Vec::new();
    push_nonempty(&mut parts, field(node, "typeName"));

    if node.bool_field("indexed") == Some(true) {
        parts.push("indexed".to_string());
    }

    if node.bool_field("stateVariable") == Some(true) {
        push_nonempty(&mut parts, node.str_field("visibility").to_string());
        match node.str_field("mutability") {
            "constant" | "immutable" => parts.push(node.str_field("mutability").to_string()),
            _ if node.bool_field("constant") == Some(true) => parts.push("constant".to_string()),
            _ => {}
        }
        push_nonempty(&mut parts, field(node, "overrides"));
    } else {
        match node.str_field("storageLocation") {
            "" | "default" => {}
            location => parts.push(location.to_string()),
        }
    }

    push_nonempty(&mut parts, node.str_field("name").to_string());

    if let Some(value) = node.get("value") {
        parts.push(format!("= {}", unparse_value(value)));
    }

    parts.join(" ")
}

fn function_definition(node: Node<'_>) -> String {
    let kind = node.str_field("kind");
    let name = match kind {
        "constructor" | "fallback" | "receive" => kind.to_string(),
        _ if node.bool_field("isConstructor") == Some(true) => "constructor".to_string(),
        _ => format!("function {}", node.str_field("name")),
    };

    let mut header = vec![format!("{}({})", name, field(node, "parameters"))];
    push_nonempty(&mut header, node.str_field("visibility").to_string());
    match node.str_field("stateMutability") {
        "" | "nonpayable" => {}
        mutability => header.push(mutability.to_string()),
    }
    if node.bool_field("virtual") == Some(true) {
        header.push("virtual".to_string());
    }
    push_nonempty(&mut header, field(node, "overrides"));
    for modifier in node.children("modifiers") {
        header.push(unparse(modifier));
    }

    let returns = field(node, "returnParameters");
    if !returns.is_empty() {
        header.push(format!("returns ({})", returns));
    }

    with_body(header, node)
}

fn contract_definition(node: Node<'_>) -> String {
    let kind = match node.str_field("contractKind") {
        "" => "contract",
        kind => kind,
    };

    let mut text = format!("{} {}", kind, node.str_field("name"));
    if node.bool_field("abstract") == Some(true) {
        text.insert_str(0, "abstract ");
    }

    let bases = list(node, "baseContracts", ", ");
    if !bases.is_empty() {
        text.push_str(&format!(" is {}", bases));
    }
    text
}

fn import_directive(node: Node<'_>) -> String {
    let path = match node.str_field("file") {
        "" => node.str_field("absolutePath"),
        file => file,
    };

    let alias = node.str_field("unitAlias");
    if !alias.is_empty() {
        return format!("import \"{}\" as {};", path, alias);
    }

    let symbols: Vec<String> = node
        .get("symbolAliases")
        .and_then(Value::as_array)
        .map(|aliases| {
            aliases
                .iter()
                .filter_map(|alias| {
                    let foreign = unparse_value(alias.get("foreign")?);
                    match alias.get("local").and_then(Value::as_str) {
                        Some(local) if !local.is_empty() && local != foreign => {
                            Some(format!("{} as {}", foreign, local))
                        }
                        _ => Some(foreign),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    if symbols.is_empty() {
        format!("import \"{}\";", path)
    } else {
        format!("import {{{}}} from \"{}\";", symbols.join(", "), path)
    }
}

fn using_for_directive(node: Node<'_>) -> String {
    let library = match node.child("libraryName") {
        Some(library) => unparse(library),
        None => {
            let functions: Vec<String> = node
                .get("functionList")
                .and_then(Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .map(|entry| {
                            let function = entry
                                .get("function")
                                .or_else(|| entry.get("definition"))
                                .map(unparse_value)
                                .unwrap_or_default();
                            match entry.get("operator").and_then(Value::as_str) {
                                Some(operator) => format!("{} as {}", function, operator),
                                None => function,
                            }
                        })
                        .collect()
                })
                .unwrap_or_default();
            format!("{{{}}}", functions.join(", "))
        }
    };

    let target = match node.child("typeName") {
        Some(type_name) => unparse(type_name),
        None => "*".to_string(),
    };
    let global = if node.bool_field("global") == Some(true) {
        " global"
    } else {
        ""
    };

    format!("using {} for {}{};", library, target, global)
}

fn try_statement(node: Node<'_>) -> String {
    let clauses = node.children("clauses");
    let mut text = format!("try {}", field(node, "externalCall"));

    if let Some((success, catches)) = clauses.split_first() {
        let returns = field(*success, "parameters");
        if !returns.is_empty() {
            text.push_str(&format!(" returns ({})", returns));
        }
        text.push_str(&format!(" {}", field(*success, "block")));
        for clause in catches {
            text.push_str(&format!(" {}", unparse(*clause)));
        }
    }

    text
}

fn inline_assembly(node: Node<'_>) -> String {
    let body = match node.child("AST").or_else(|| node.child("yulBlock")) {
        Some(block) => unparse(block),
        None => node.str_field("operations").to_string(),
    };

    let flags: Vec<String> = strings(node, "flags")
        .into_iter()
        .map(|flag| format!("\"{}\"", flag))
        .collect();
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!("({})", flags.join(", "))
    };

    words(&["assembly".to_string(), flags, body])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: Value) -> String {
        unparse_value(&value)
    }

    fn ident(name: &str) -> Value {
        json!({"nodeType": "Identifier", "name": name})
    }

    fn number(value: &str) -> Value {
        json!({"nodeType": "Literal", "kind": "number", "value": value})
    }

    #[test]
    fn test_every_known_tag_has_a_rule() {
        for tag in NodeType::ALL_TAGS {
            let text = render(json!({"nodeType": tag}));
            assert!(
                !text.starts_with("<unhandled"),
                "{} fell through to the fallback: {}",
                tag,
                text
            );
        }
    }

    #[test]
    fn test_unknown_and_non_nodes() {
        assert_eq!(
            render(json!({"nodeType": "FancyNewNode"})),
            "<unhandled FancyNewNode>"
        );
        assert_eq!(render(json!({"name": "x"})), "");
        assert_eq!(render(json!("text")), "");
        assert_eq!(render(Value::Null), "");
    }

    #[test]
    fn test_binary_and_assignment() {
        let expr = json!({
            "nodeType": "Assignment",
            "operator": "+=",
            "leftHandSide": ident("total"),
            "rightHandSide": {
                "nodeType": "BinaryOperation",
                "operator": "*",
                "leftExpression": ident("price"),
                "rightExpression": number("2")
            }
        });
        assert_eq!(render(expr), "total += (price * 2)");
    }

    #[test]
    fn test_unary_operation() {
        let increment = json!({
            "nodeType": "UnaryOperation",
            "operator": "++",
            "prefix": false,
            "subExpression": ident("i")
        });
        assert_eq!(render(increment), "i++");

        let delete = json!({
            "nodeType": "UnaryOperation",
            "operator": "delete",
            "prefix": true,
            "subExpression": ident("x")
        });
        assert_eq!(render(delete), "delete x");
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            render(json!({"nodeType": "Literal", "kind": "string", "value": "hi"})),
            "\"hi\""
        );
        assert_eq!(
            render(json!({"nodeType": "Literal", "kind": "bool", "value": "false"})),
            "false"
        );
        assert_eq!(
            render(json!({"nodeType": "Literal", "kind": "number", "value": "1", "subdenomination": "ether"})),
            "1 ether"
        );
        assert_eq!(
            render(json!({"nodeType": "Literal", "kind": "hexString", "hexValue": "00ff"})),
            "hex\"00ff\""
        );
    }

    #[test]
    fn test_require_call_statement() {
        let statement = json!({
            "nodeType": "ExpressionStatement",
            "expression": {
                "nodeType": "FunctionCall",
                "expression": ident("require"),
                "arguments": [
                    {
                        "nodeType": "BinaryOperation",
                        "operator": ">=",
                        "leftExpression": {
                            "nodeType": "MemberAccess",
                            "memberName": "value",
                            "expression": ident("msg")
                        },
                        "rightExpression": ident("price")
                    },
                    {"nodeType": "Literal", "kind": "string", "value": "too cheap"}
                ]
            }
        });
        assert_eq!(
            render(statement),
            "require((msg.value >= price), \"too cheap\");"
        );
    }

    #[test]
    fn test_call_with_options_and_named_arguments() {
        let call = json!({
            "nodeType": "FunctionCall",
            "expression": {
                "nodeType": "FunctionCallOptions",
                "expression": {"nodeType": "MemberAccess", "memberName": "call", "expression": ident("to")},
                "names": ["value"],
                "options": [ident("amount")]
            },
            "arguments": [{"nodeType": "Literal", "kind": "string", "value": ""}]
        });
        assert_eq!(render(call), "to.call{value: amount}(\"\")");

        let named = json!({
            "nodeType": "FunctionCall",
            "expression": ident("Point"),
            "names": ["x", "y"],
            "arguments": [number("1"), number("2")]
        });
        assert_eq!(render(named), "Point({x: 1, y: 2})");
    }

    #[test]
    fn test_if_else_and_return() {
        let statement = json!({
            "nodeType": "IfStatement",
            "condition": ident("ok"),
            "trueBody": {"nodeType": "Return", "expression": number("1")},
            "falseBody": {"nodeType": "Return"}
        });
        assert_eq!(render(statement), "if (ok) return 1; else return;");
    }

    #[test]
    fn test_for_loop() {
        let statement = json!({
            "nodeType": "ForStatement",
            "initializationExpression": {
                "nodeType": "VariableDeclarationStatement",
                "declarations": [{
                    "nodeType": "VariableDeclaration",
                    "name": "i",
                    "storageLocation": "default",
                    "typeName": {"nodeType": "ElementaryTypeName", "name": "uint256"}
                }],
                "initialValue": number("0")
            },
            "condition": {
                "nodeType": "BinaryOperation",
                "operator": "<",
                "leftExpression": ident("i"),
                "rightExpression": number("10")
            },
            "loopExpression": {
                "nodeType": "ExpressionStatement",
                "expression": {"nodeType": "UnaryOperation", "operator": "++", "prefix": false, "subExpression": ident("i")}
            },
            "body": {"nodeType": "Block", "statements": []}
        });
        assert_eq!(
            render(statement),
            "for (uint256 i = 0; (i < 10); i++) { }"
        );
    }

    #[test]
    fn test_tuple_destructuring() {
        let statement = json!({
            "nodeType": "VariableDeclarationStatement",
            "declarations": [
                null,
                {"nodeType": "VariableDeclaration", "name": "b", "storageLocation": "memory",
                 "typeName": {"nodeType": "ElementaryTypeName", "name": "bytes"}}
            ],
            "initialValue": {"nodeType": "FunctionCall", "expression": ident("f"), "arguments": []}
        });
        assert_eq!(render(statement), "(, bytes memory b) = f();");
    }

    #[test]
    fn test_function_definition() {
        let function = json!({
            "nodeType": "FunctionDefinition",
            "kind": "function",
            "name": "transfer",
            "visibility": "public",
            "stateMutability": "nonpayable",
            "parameters": {"nodeType": "ParameterList", "parameters": [
                {"nodeType": "VariableDeclaration", "name": "to", "storageLocation": "default",
                 "typeName": {"nodeType": "ElementaryTypeName", "name": "address"}},
                {"nodeType": "VariableDeclaration", "name": "amount", "storageLocation": "default",
                 "typeName": {"nodeType": "ElementaryTypeName", "name": "uint256"}}
            ]},
            "returnParameters": {"nodeType": "ParameterList", "parameters": [
                {"nodeType": "VariableDeclaration", "name": "", "storageLocation": "default",
                 "typeName": {"nodeType": "ElementaryTypeName", "name": "bool"}}
            ]},
            "modifiers": [{"nodeType": "ModifierInvocation", "modifierName": {"nodeType": "IdentifierPath", "name": "onlyOwner"}}],
            "body": {"nodeType": "Block", "statements": [{"nodeType": "Return", "expression": {"nodeType": "Literal", "kind": "bool", "value": "true"}}]}
        });
        assert_eq!(
            render(function),
            "function transfer(address to, uint256 amount) public onlyOwner returns (bool) {\nreturn true;\n}"
        );

        let interface_fn = json!({
            "nodeType": "FunctionDefinition",
            "kind": "receive",
            "visibility": "external",
            "stateMutability": "payable",
            "parameters": {"nodeType": "ParameterList", "parameters": []},
            "returnParameters": {"nodeType": "ParameterList", "parameters": []}
        });
        assert_eq!(render(interface_fn), "receive() external payable;");
    }

    #[test]
    fn test_state_variable() {
        let variable = json!({
            "nodeType": "VariableDeclaration",
            "name": "balances",
            "stateVariable": true,
            "visibility": "public",
            "mutability": "mutable",
            "storageLocation": "default",
            "typeName": {
                "nodeType": "Mapping",
                "keyType": {"nodeType": "ElementaryTypeName", "name": "address"},
                "valueType": {"nodeType": "ElementaryTypeName", "name": "uint256"}
            }
        });
        assert_eq!(
            render(variable),
            "mapping(address => uint256) public balances"
        );

        let constant = json!({
            "nodeType": "VariableDeclaration",
            "name": "MAX",
            "stateVariable": true,
            "visibility": "internal",
            "mutability": "constant",
            "typeName": {"nodeType": "ElementaryTypeName", "name": "uint8"},
            "value": number("255")
        });
        assert_eq!(render(constant), "uint8 internal constant MAX = 255");
    }

    #[test]
    fn test_declarations() {
        assert_eq!(
            render(json!({
                "nodeType": "ContractDefinition",
                "name": "BeerBar",
                "contractKind": "contract",
                "abstract": false,
                "baseContracts": [{
                    "nodeType": "InheritanceSpecifier",
                    "baseName": {"nodeType": "IdentifierPath", "name": "Ownable"}
                }]
            })),
            "contract BeerBar is Ownable"
        );
        assert_eq!(
            render(json!({
                "nodeType": "EnumDefinition",
                "name": "State",
                "members": [
                    {"nodeType": "EnumValue", "name": "Open"},
                    {"nodeType": "EnumValue", "name": "Closed"}
                ]
            })),
            "enum State { Open, Closed }"
        );
        assert_eq!(
            render(json!({
                "nodeType": "PragmaDirective",
                "literals": ["solidity", "^", "0.8", ".0"]
            })),
            "pragma solidity ^0.8.0;"
        );
        assert_eq!(
            render(json!({
                "nodeType": "ImportDirective",
                "file": "./Token.sol",
                "unitAlias": "",
                "symbolAliases": [{"foreign": ident("Token"), "local": "T"}]
            })),
            "import {Token as T} from \"./Token.sol\";"
        );
        assert_eq!(
            render(json!({
                "nodeType": "UsingForDirective",
                "libraryName": {"nodeType": "IdentifierPath", "name": "SafeMath"},
                "typeName": {"nodeType": "ElementaryTypeName", "name": "uint256"}
            })),
            "using SafeMath for uint256;"
        );
    }

    #[test]
    fn test_placeholder_spellings() {
        assert_eq!(render(json!({"nodeType": "PlaceholderStatement"})), "_;");
        assert_eq!(render(json!({"nodeType": "PlaceHolderStatement"})), "_;");
    }

    #[test]
    fn test_revert_and_emit() {
        let revert = json!({
            "nodeType": "RevertStatement",
            "errorCall": {"nodeType": "FunctionCall", "expression": ident("Unauthorized"), "arguments": []}
        });
        assert_eq!(render(revert), "revert Unauthorized();");

        let emit = json!({
            "nodeType": "EmitStatement",
            "eventCall": {"nodeType": "FunctionCall", "expression": ident("Paid"), "arguments": [ident("who")]}
        });
        assert_eq!(render(emit), "emit Paid(who);");
    }

    #[test]
    fn test_inline_assembly() {
        let assembly = json!({
            "nodeType": "InlineAssembly",
            "flags": ["memory-safe"],
            "AST": {
                "nodeType": "YulBlock",
                "statements": [{
                    "nodeType": "YulVariableDeclaration",
                    "variables": [{"nodeType": "YulTypedName", "name": "x", "type": ""}],
                    "value": {
                        "nodeType": "YulFunctionCall",
                        "functionName": {"nodeType": "YulIdentifier", "name": "sload"},
                        "arguments": [{"nodeType": "YulLiteral", "kind": "number", "value": "0"}]
                    }
                }]
            }
        });
        assert_eq!(
            render(assembly),
            "assembly (\"memory-safe\") {\nlet x := sload(0)\n}"
        );
    }

    #[test]
    fn test_yul_switch() {
        let switch = json!({
            "nodeType": "YulSwitch",
            "expression": {"nodeType": "YulIdentifier", "name": "x"},
            "cases": [
                {"nodeType": "YulCase", "value": {"nodeType": "YulLiteral", "kind": "number", "value": "1"},
                 "body": {"nodeType": "YulBlock", "statements": [{"nodeType": "YulLeave"}]}},
                {"nodeType": "YulCase", "value": "default",
                 "body": {"nodeType": "YulBlock", "statements": []}}
            ]
        });
        assert_eq!(render(switch), "switch x case 1 {\nleave\n} default { }");
    }

    #[test]
    fn test_try_catch() {
        let statement = json!({
            "nodeType": "TryStatement",
            "externalCall": {"nodeType": "FunctionCall", "expression": {
                "nodeType": "MemberAccess", "memberName": "run", "expression": ident("job")}, "arguments": []},
            "clauses": [
                {"nodeType": "TryCatchClause", "errorName": "", "block": {"nodeType": "Block", "statements": []}},
                {"nodeType": "TryCatchClause", "errorName": "Error",
                 "parameters": {"nodeType": "ParameterList", "parameters": [
                     {"nodeType": "VariableDeclaration", "name": "reason", "storageLocation": "memory",
                      "typeName": {"nodeType": "ElementaryTypeName", "name": "string"}}]},
                 "block": {"nodeType": "Block", "statements": []}},
                {"nodeType": "TryCatchClause", "errorName": "", "block": {"nodeType": "Block", "statements": []}}
            ]
        });
        assert_eq!(
            render(statement),
            "try job.run() { } catch Error(string memory reason) { } catch { }"
        );
    }
}
