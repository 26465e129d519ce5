use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout, stdin, stdout};

use super::Ui;
use crate::error::Result;

/// How long an auto-played line stays on screen before it is acted on.
const AUTO_PLAY_DELAY: Duration = Duration::from_millis(400);

/// Reads commands from stdin and writes narration to stdout in yellow.
pub struct Terminal {
	lines: Lines<BufReader<Stdin>>,
	out: Stdout,
	exiting: bool,
}

impl Terminal {
	pub fn new() -> Self {
		Self {
			lines: BufReader::new(stdin()).lines(),
			out: stdout(),
			exiting: false,
		}
	}

	async fn write(&mut self, text: &str) -> Result<()> {
		self.out.write_all(text.as_bytes()).await?;
		self.out.flush().await?;
		Ok(())
	}
}

impl Default for Terminal {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait(?Send)]
impl Ui for Terminal {
	async fn start(&mut self, title: &str) -> Result<()> {
		debug!("terminal session for {title}");
		self.exiting = false;
		Ok(())
	}

	async fn show(&mut self, message: &str) -> Result<()> {
		self.say(message).await
	}

	async fn say(&mut self, message: &str) -> Result<()> {
		self.write(&format!("\n\x1b[33m{message}\x1b[0m\n")).await
	}

	async fn prompt(&mut self, default: Option<&str>, auto_play: bool) -> Result<Option<String>> {
		let question = match default {
			Some(default) => format!("> ({default})"),
			None => "> ".to_owned(),
		};

		if let (Some(default), true) = (default, auto_play) {
			self.write(&format!("{question}\n")).await?;
			tokio::time::sleep(AUTO_PLAY_DELAY).await;
			return Ok(Some(default.to_owned()));
		}

		loop {
			self.write(&question).await?;
			let Some(line) = self.lines.next_line().await? else {
				return Ok(None);
			};
			let line = line.trim();
			if !line.is_empty() {
				return Ok(Some(line.to_owned()));
			}
			if let Some(default) = default {
				return Ok(Some(default.to_owned()));
			}
		}
	}

	async fn clear(&mut self) -> Result<()> {
		self.write("\x1b[33m\n\n---------\n\n\x1b[0m\n").await
	}

	async fn close(&mut self) -> Result<()> {
		if self.exiting {
			return Ok(());
		}
		self.exiting = true;
		self.out.flush().await?;
		Ok(())
	}
}
