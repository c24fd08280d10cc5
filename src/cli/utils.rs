use serde_json::{json, Map, Value};

use crate::cli::OutputFormat;

/// JSON report for a finished command; object `data` is merged at the top level
fn success_report(message: &str, data: Option<Value>) -> Value {
    let mut report = Map::new();
    report.insert("success".into(), Value::Bool(true));
    report.insert("message".into(), json!(message));
    match data {
        Some(Value::Object(extra)) => report.extend(extra),
        Some(other) => {
            report.insert("data".into(), other);
        }
        None => {}
    }
    Value::Object(report)
}

fn error_report(message: &str, error_code: Option<&str>) -> Value {
    let mut report = json!({ "success": false, "error": message });
    if let Some(code) = error_code {
        report["error_code"] = json!(code);
    }
    report
}

pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&success_report(message, data))?),
        OutputFormat::Text => println!("✓ {}", message),
    }
    Ok(())
}

/// Errors go to stderr in text mode so scripts can still parse stdout
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&error_report(message, error_code))?),
        OutputFormat::Text => eprintln!("Error: {}", message),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_data_is_flattened() {
        let report = success_report("Granted", Some(json!({ "newTokenBalance": 75 })));
        assert_eq!(report["success"], true);
        assert_eq!(report["newTokenBalance"], 75);
    }

    #[test]
    fn scalar_data_is_nested() {
        let report = success_report("Imported", Some(json!(42)));
        assert_eq!(report["data"], 42);
    }

    #[test]
    fn error_code_is_optional() {
        assert!(error_report("boom", None).get("error_code").is_none());
        assert_eq!(error_report("boom", Some("DATABASE_UNAVAILABLE"))["error_code"], "DATABASE_UNAVAILABLE");
    }
}
