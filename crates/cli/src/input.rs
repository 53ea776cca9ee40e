//! Line-oriented user input.

use std::io::BufRead;

use tokio::sync::mpsc;
use tracing::debug;

/// Reads stdin on a dedicated thread and forwards each line.
///
/// The channel closes at end of input. The thread is detached: a blocking read
/// cannot be cancelled, and the process exits without joining it.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
	let (tx, rx) = mpsc::channel(32);
	std::thread::spawn(move || forward_lines(std::io::stdin().lock(), &tx));
	rx
}

fn forward_lines(reader: impl BufRead, tx: &mpsc::Sender<String>) {
	for line in reader.lines() {
		match line {
			Ok(line) => {
				if tx.blocking_send(line).is_err() {
					break;
				}
			}
			Err(err) => {
				debug!(target: "dsc", error = %err, "stdin read failed");
				break;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn forwards_lines_until_eof() {
		let (tx, mut rx) = mpsc::channel(8);
		forward_lines("o\n b \n\nx".as_bytes(), &tx);
		drop(tx);

		let mut lines = Vec::new();
		while let Ok(line) = rx.try_recv() {
			lines.push(line);
		}
		assert_eq!(lines, ["o", " b ", "", "x"]);
	}
}
