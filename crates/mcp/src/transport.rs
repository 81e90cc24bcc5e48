//! Line-delimited stdio loop: one JSON-RPC message per line in, one response
//! per line out.

use {
    tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    tracing::{debug, info},
};

use crate::{error::Result, server::McpServer};

/// Serve until `reader` reaches EOF.
pub async fn serve<R, W>(server: &McpServer, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        debug!(raw = %trimmed, "client -> server");

        let Some(response) = server.handle_message(trimmed).await else {
            continue;
        };
        let mut payload = serde_json::to_string(&response)?;
        payload.push('\n');
        writer.write_all(payload.as_bytes()).await?;
        writer.flush().await?;
    }
    debug!("client closed stdin");
    Ok(())
}

pub async fn serve_stdio(server: &McpServer) -> Result<()> {
    info!("serving skills over stdio");
    serve(
        server,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}
