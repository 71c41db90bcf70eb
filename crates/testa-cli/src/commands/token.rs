use anyhow::{Context, Result};
use testa_core::token::{FileDescriptor, SessionToken};
use testa_infrastructure::{FernetTokenDecoder, SecretStorage};

/// Prints a launch token for the given assistant and input files.
pub fn encode(
    key: Option<String>,
    api_key: String,
    assistant: String,
    files: &[String],
) -> Result<()> {
    let key = match key {
        Some(key) => key,
        None => SecretStorage::new()?.resolve_token_key()?,
    };
    let file_ids = files
        .iter()
        .map(|arg| parse_file_arg(arg))
        .collect::<Result<Vec<_>>>()?;

    let token = SessionToken {
        key: api_key,
        assistant,
        file_ids,
    };
    let encoded = FernetTokenDecoder::from_base64_key(&key)?.encode(&token)?;
    println!("{encoded}");
    Ok(())
}

fn parse_file_arg(arg: &str) -> Result<FileDescriptor> {
    let (id, name) = arg
        .split_once(':')
        .filter(|(id, name)| !id.is_empty() && !name.is_empty())
        .with_context(|| format!("Expected --file id:name, got '{arg}'"))?;
    Ok(FileDescriptor {
        id: id.to_string(),
        name: name.to_string(),
    })
}
