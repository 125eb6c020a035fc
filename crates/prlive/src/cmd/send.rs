use serde_json::Value;

use crate::cmd::session::Session;
use crate::cmd::SendArgs;
use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub async fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let kind = args.kind.trim();
    if kind.is_empty() {
        return Err(CliError::new(USAGE, "--type must not be empty"));
    }
    let payload = resolve_payload(args.json.as_deref())?;

    let wait = args.reply.wait_for()?;
    let session = Session::open(&args.connect).await?;
    session.channel.send(kind, payload);
    session.finish(wait, format).await
}

fn resolve_payload(json: Option<&str>) -> CliResult<Value> {
    match json {
        Some(json) => serde_json::from_str(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}"))),
        None => Ok(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn payload_defaults_to_null() {
        assert_eq!(resolve_payload(None).unwrap(), Value::Null);
    }

    #[test]
    fn payload_must_be_json() {
        assert_eq!(
            resolve_payload(Some(r#"{"prId": 3}"#)).unwrap(),
            json!({ "prId": 3 })
        );
        assert_eq!(resolve_payload(Some("{prId: 3}")).unwrap_err().code, USAGE);
    }
}
