use crate::connections::errors::ConnectionError;
use crate::core::session::Session;
use log::info;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::error::RecvError;

/// Drives an interactive session: remote output is echoed to `output` by a
/// spawned task while this function reads `input` line by line.
///
/// A line equal to `exit` (case-insensitive) ends the session and is *not*
/// forwarded; every other line is forwarded with a trailing `\n`. End of
/// local input ends the session the same way. The session is closed before
/// returning, whatever the exit reason.
pub async fn run_relay<R, W>(session: Session, input: R, output: W) -> Result<(), ConnectionError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut session_receiver = session.subscribe();

    // -> echo to the user's terminal
    let echo_task = tokio::spawn(async move {
        let mut output = output;
        loop {
            match session_receiver.recv().await {
                Ok(chunk) => {
                    if output.write_all(&chunk).await.is_err() {
                        break;
                    }
                    let _ = output.flush().await;
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = input.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.eq_ignore_ascii_case("exit") {
                    info!("Exit requested, ending session.");
                    break;
                }
                let mut bytes = line.into_bytes();
                bytes.push(b'\n');
                if session.write_bytes(&bytes).await.is_err() {
                    break;
                }
            }
            // local input ended; a normal termination trigger, not an error
            Ok(None) => {
                info!("Local input closed, ending session.");
                break;
            }
            Err(e) => {
                info!("Local input error ({}), ending session.", e);
                break;
            }
        }
    }

    session.close().await?;
    // closing dropped the broadcast sender, so the echo task drains and exits
    let _ = echo_task.await;
    Ok(())
}
