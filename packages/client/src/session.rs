//! TCP client session management.

use std::sync::Arc;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::mpsc,
};

use chatrelay_shared::time::Clock;

use crate::{
    domain::{FrameAssembler, InputCommand, parse_input},
    error::ClientError,
    formatter::MessageFormatter,
    ui::redisplay_prompt,
};

const READ_BUFFER_SIZE: usize = 1024;

/// Run the TCP client session
///
/// Returns `Ok(())` when the user leaves with `/quit`, Ctrl+C or Ctrl+D.
pub async fn run_client_session(
    addr: &str,
    username: &str,
    clock: Arc<dyn Clock>,
) -> Result<(), ClientError> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|source| ClientError::Connect {
            addr: addr.to_string(),
            source,
        })?;

    let (mut read, mut write) = stream.into_split();

    // The first frame names this client
    write
        .write_all(format!("{}\n", username).as_bytes())
        .await
        .map_err(|e| ClientError::ConnectionLost(e.to_string()))?;

    tracing::info!("Connected to chat server at {}", addr);
    println!(
        "\nYou are '{}'. Type messages and press Enter to send. Use /dm <user> <message> for direct messages, /quit to exit.\n",
        username
    );

    let username_for_read = username.to_string();
    let mut read_task = tokio::spawn(async move {
        let mut buffer = [0u8; READ_BUFFER_SIZE];
        let mut assembler = FrameAssembler::new();

        loop {
            let n = match read.read(&mut buffer).await {
                Ok(0) => {
                    tracing::info!("Server closed the connection");
                    return true;
                }
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!("Read error: {}", e);
                    return true;
                }
            };

            let frames = assembler.push(&buffer[..n]);
            if frames.is_empty() {
                continue;
            }
            for frame in frames {
                let formatted =
                    MessageFormatter::format_frame(&frame, &username_for_read, clock.as_ref());
                print!("{}", formatted);
            }
            redisplay_prompt(&username_for_read);
        }
    });

    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // rustyline is synchronous, so it gets its own thread
    let prompt = format!("{}> ", username);
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line.as_str()).ok();
                    if input_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    let username_for_write = username.to_string();
    let mut write_task = tokio::spawn(async move {
        while let Some(line) = input_rx.recv().await {
            match parse_input(&line) {
                InputCommand::Quit => break,
                InputCommand::Usage(usage) => {
                    println!("{}", usage);
                    redisplay_prompt(&username_for_write);
                }
                InputCommand::Send(frame) => {
                    if let Err(e) = write.write_all(frame.as_bytes()).await {
                        tracing::warn!("Failed to send message: {}", e);
                        return true;
                    }
                }
            }
        }

        write.shutdown().await.ok();
        false
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            if read_result.unwrap_or(true) {
                return Err(ClientError::ConnectionLost(
                    "server closed the connection".to_string(),
                ));
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            if write_result.unwrap_or(true) {
                return Err(ClientError::ConnectionLost(
                    "failed to send message".to_string(),
                ));
            }
        }
    }

    Ok(())
}
