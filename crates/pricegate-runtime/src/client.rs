//! Socket client for the `pricegate call` subcommand.
//!
//! Connects, sends hello + one invoke, prints every received frame as a
//! JSON line, then lingers briefly for out-of-band notifications.

use std::collections::HashMap;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::cli::CallOpts;
use crate::protocol::{ClientFrame, ServerFrame, ToolRequest};

pub async fn cmd_call(socket_path: &str, opts: &CallOpts) -> anyhow::Result<()> {
    let stream = UnixStream::connect(socket_path)
        .await
        .map_err(|e| anyhow::anyhow!("cannot connect to daemon at {socket_path}: {e}"))?;
    let (reader, mut writer) = stream.into_split();

    let headers = parse_headers(&opts.headers)?;
    let arguments = parse_arguments(&opts.args)?;

    let hello = ClientFrame::Hello {
        session_id: opts.session.clone(),
        last_event_id: opts.last_event.clone(),
        headers,
    };
    write_frame(&mut writer, &hello).await?;

    let invoke = ClientFrame::Invoke {
        id: 1,
        tool: ToolRequest {
            name: opts.tool.clone(),
            arguments,
        },
    };
    write_frame(&mut writer, &invoke).await?;

    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    let mut responded = false;
    loop {
        line.clear();
        let read = if responded {
            // Response is in; give trailing notifications a moment to land.
            match timeout(
                Duration::from_millis(opts.linger_ms),
                reader.read_line(&mut line),
            )
            .await
            {
                Ok(read) => read?,
                Err(_) => break,
            }
        } else {
            reader.read_line(&mut line).await?
        };
        if read == 0 {
            break;
        }

        let frame: ServerFrame = serde_json::from_str(line.trim())?;
        println!("{}", serde_json::to_string(&frame)?);

        match frame {
            ServerFrame::Response { .. } => responded = true,
            ServerFrame::Error { message } => anyhow::bail!("server error: {message}"),
            _ => {}
        }
    }

    Ok(())
}

async fn write_frame(
    writer: &mut (impl AsyncWriteExt + Unpin),
    frame: &ClientFrame,
) -> anyhow::Result<()> {
    let mut encoded = serde_json::to_string(frame)?;
    encoded.push('\n');
    writer.write_all(encoded.as_bytes()).await?;
    Ok(())
}

/// Parse `NAME:VALUE` header flags into the raw map sent on the hello.
fn parse_headers(raw: &[String]) -> anyhow::Result<HashMap<String, String>> {
    let mut headers = HashMap::new();
    for entry in raw {
        let (name, value) = entry
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("invalid header {entry:?} (expected NAME:VALUE)"))?;
        headers.insert(name.trim().to_string(), value.trim().to_string());
    }
    Ok(headers)
}

/// Parse `KEY=VALUE` argument flags into the tool arguments object.
fn parse_arguments(raw: &[String]) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    let mut arguments = serde_json::Map::new();
    for entry in raw {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("invalid argument {entry:?} (expected KEY=VALUE)"))?;
        arguments.insert(
            key.trim().to_string(),
            serde_json::Value::String(value.trim().to_string()),
        );
    }
    Ok(arguments)
}

// ─── Tests ───────────────────────────────────────────────────────────
