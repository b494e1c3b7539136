//! `pkgscope serve`: line-delimited tool calls on stdin.
//!
//! Each input line is one JSON call, `{"tool": "...", "args": {...}}`. Each
//! answer is the text report followed by an empty line. The analysis cache
//! lives as long as the loop, so later calls reuse earlier analyses.

use anyhow::{Context, Result};
use pkgscope_tools::{ToolCall, Toolbox};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Parse one input line into a call, or the message to answer with.
pub fn parse_call(line: &str) -> std::result::Result<ToolCall, String> {
    serde_json::from_str(line).map_err(|e| format!("Error (invalid input): malformed tool call: {e}\n"))
}

/// Answer calls from `input` until it is exhausted or `shutdown` fires.
pub async fn serve<R, W>(toolbox: &Toolbox, input: R, mut output: W, shutdown: &CancellationToken) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut handled = 0;
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line.context("reading tool call")?,
        };
        let Some(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let report = match parse_call(line) {
            Ok(call) => {
                debug!(tool = call.name(), "tool call");
                toolbox.call(&call, &shutdown.child_token()).await
            }
            Err(message) => message,
        };
        output.write_all(report.as_bytes()).await?;
        if !report.ends_with('\n') {
            output.write_all(b"\n").await?;
        }
        output.write_all(b"\n").await?;
        output.flush().await?;
        handled += 1;
    }
    info!(calls = handled, "serve loop finished");
    Ok(handled)
}

/// Cancel `shutdown` on the first interrupt signal.
pub fn cancel_on_interrupt(shutdown: &CancellationToken) {
    let shutdown = shutdown.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown.cancelled() => {}
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => {
                    info!("interrupt received, cancelling in-flight calls");
                    shutdown.cancel();
                }
                Err(e) => warn!(error = %e, "cannot listen for interrupts"),
            },
        }
    });
}

/// Serve on the process's stdin and stdout until input ends or an interrupt
/// arrives.
pub async fn run(toolbox: &Toolbox) -> Result<()> {
    let shutdown = CancellationToken::new();
    cancel_on_interrupt(&shutdown);
    serve(toolbox, BufReader::new(tokio::io::stdin()), tokio::io::stdout(), &shutdown).await?;
    shutdown.cancel();
    Ok(())
}
