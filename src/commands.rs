//! Command execution.

use crate::config::Config;
use crate::Commands;
use colored::Colorize;
use serde_json::Value as Json;
use sproc_codec::{armor, StoredProcCall, StoredProcCodec, Value};

/// Executes a command and returns the formatted output.
pub fn execute(cmd: Commands, config: &Config) -> Result<String, Box<dyn std::error::Error>> {
    let codec = StoredProcCodec::new(config.codec.clone());

    match cmd {
        Commands::Encode { args } => {
            let values = parse_args(&parse_json_arg(&args)?)?;
            Ok(codec.serialize_and_armor(&values)?)
        }

        Commands::Decode { text, raw } => {
            let value = if raw {
                codec.unarmor_and_deserialize(text.trim())?
            } else {
                codec.decode_response(text.trim())?
            };
            Ok(format_json(&value.to_json()?))
        }

        Commands::Pack { hex: input } => {
            let bytes = hex::decode(input.trim())?;
            Ok(armor::pack(&bytes))
        }

        Commands::Unpack { text } => {
            let bytes = armor::unpack_with(text.trim(), config.codec.armor_mode)?;
            Ok(hex::encode(bytes))
        }

        Commands::Request {
            function,
            module,
            root,
            args,
        } => {
            let values = args
                .iter()
                .map(|arg| Ok(Value::from_json(&parse_json_arg(arg)?)?))
                .collect::<Result<Vec<_>, Box<dyn std::error::Error>>>()?;
            let call = StoredProcCall::new(function, module).with_args(values);

            let (header, script) = call.scripts_header();
            let (param, encoded) = call.encoded_args(&codec)?;
            Ok(format!(
                "{} {}\n  {}: {}\n  {}={}",
                "POST".bold(),
                call.location(&root).cyan(),
                header,
                script,
                param,
                encoded
            ))
        }

        Commands::Config => Ok(config.to_yaml()?),
    }
}

/// Turns a JSON document into an argument list.
///
/// An array is taken as the list itself; anything else is a single argument.
fn parse_args(json: &Json) -> Result<Vec<Value>, sproc_codec::CodecError> {
    match json {
        Json::Array(items) => items.iter().map(Value::from_json).collect(),
        other => Ok(vec![Value::from_json(other)?]),
    }
}

/// Parses a JSON argument (supports @file syntax).
fn parse_json_arg(arg: &str) -> Result<Json, Box<dyn std::error::Error>> {
    if let Some(path) = arg.strip_prefix('@') {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(arg)?)
    }
}

/// Formats JSON for display.
fn format_json(value: &Json) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
