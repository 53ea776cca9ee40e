use std::fmt;

/// User command understood by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
	StartScan,
	StopScan,
	/// Connect to the discovered device at this 1-based ordinal.
	SelectDevice(usize),
	/// Connect to the single continuous-link device (ordinal 1).
	OpenSingleDevice,
	Close,
	StartMeasuring,
	StopMeasuring,
	GetBattery,
	SwitchTransport,
	Legend,
	Exit,
}

impl Command {
	/// Parses one line of user input.
	///
	/// Accepts the single-key bindings (`s`, `p`, `1`..`9`, `o`, `c`, `m`, `q`,
	/// `b`, `e`, `h`, `x`) as well as long names such as `start-scan` or
	/// `select 2`. Returns `None` for anything else.
	pub fn parse(input: &str) -> Option<Command> {
		let input = input.trim().to_ascii_lowercase();
		let mut words = input.split_whitespace();
		let head = words.next()?;
		let arg = words.next();
		if words.next().is_some() {
			return None;
		}

		if let Ok(ordinal) = head.parse::<usize>() {
			return (arg.is_none() && ordinal > 0).then_some(Command::SelectDevice(ordinal));
		}

		let command = match head {
			"select" | "select-device" => {
				let ordinal = arg?.parse::<usize>().ok().filter(|n| *n > 0)?;
				return Some(Command::SelectDevice(ordinal));
			}
			"s" | "scan" | "start-scan" => Command::StartScan,
			"p" | "stop-scan" => Command::StopScan,
			"o" | "open" | "open-single-device" => Command::OpenSingleDevice,
			"c" | "close" => Command::Close,
			"m" | "start-measuring" => Command::StartMeasuring,
			"q" | "stop-measuring" => Command::StopMeasuring,
			"b" | "battery" | "get-battery" => Command::GetBattery,
			"e" | "switch" | "switch-transport" => Command::SwitchTransport,
			"h" | "?" | "help" | "legend" => Command::Legend,
			"x" | "exit" | "quit" => Command::Exit,
			_ => return None,
		};
		arg.is_none().then_some(command)
	}

	/// Stable name used in notices and log fields.
	pub fn name(&self) -> &'static str {
		match self {
			Command::StartScan => "start-scan",
			Command::StopScan => "stop-scan",
			Command::SelectDevice(_) => "select-device",
			Command::OpenSingleDevice => "open-single-device",
			Command::Close => "close",
			Command::StartMeasuring => "start-measuring",
			Command::StopMeasuring => "stop-measuring",
			Command::GetBattery => "get-battery",
			Command::SwitchTransport => "switch-transport",
			Command::Legend => "legend",
			Command::Exit => "exit",
		}
	}
}

impl fmt::Display for Command {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Command::SelectDevice(ordinal) => write!(f, "select-device {ordinal}"),
			other => f.write_str(other.name()),
		}
	}
}
