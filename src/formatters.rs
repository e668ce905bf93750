use serde_json::Value;

use crate::problem::Signature;

/// Renders adapted arguments as `name = value, ...`
///
/// Falls back to bare values when the argument count does not line up with
/// the signature.
pub fn format_input(signature: &Signature, args: &[Value]) -> String {
    if args.len() == signature.parameters.len() {
        signature
            .parameters
            .iter()
            .zip(args)
            .map(|(name, value)| format!("{name} = {}", format_value(value)))
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        args.iter().map(format_value).collect::<Vec<_>>().join(", ")
    }
}

pub fn format_output(value: &Value) -> String {
    match value {
        // Error sentinels are shown verbatim
        Value::String(s) => s.clone(),
        other => format_compact(other),
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(format_value).collect::<Vec<_>>().join(", ")
        ),
        other => other.to_string(),
    }
}

fn format_compact(value: &Value) -> String {
    match value {
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(format_compact).collect::<Vec<_>>().join(",")
        ),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Packing;
    use serde_json::json;

    fn signature(parameters: &[&str]) -> Signature {
        Signature {
            parameters: parameters.iter().map(|s| s.to_string()).collect(),
            packing: Packing::Positional,
        }
    }

    #[test]
    fn test_format_input_with_names() {
        let sig = signature(&["nums", "target"]);
        assert_eq!(
            format_input(&sig, &[json!([2, 7, 11, 15]), json!(9)]),
            "nums = [2, 7, 11, 15], target = 9"
        );
        assert_eq!(format_input(&signature(&["n"]), &[json!(3)]), "n = 3");
    }

    #[test]
    fn test_format_input_without_names() {
        let sig = signature(&["nums", "target"]);
        assert_eq!(format_input(&sig, &[json!([1, 2])]), "[1, 2]");
    }

    #[test]
    fn test_format_output() {
        assert_eq!(format_output(&json!([0, 1])), "[0,1]");
        assert_eq!(format_output(&json!(["()", "(())"])), r#"["()","(())"]"#);
        assert_eq!(format_output(&json!("Error: boom")), "Error: boom");
        assert_eq!(format_output(&json!(null)), "null");
    }
}
