use clap::Subcommand;

use super::capture::CaptureArgs;
use super::config::ConfigArgs;
use super::label::LabelArgs;
use super::replay::ReplayArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Record one interaction on a page fixture and print the captured step
    Capture(CaptureArgs),

    /// Replay a captured scenario against a page fixture
    Replay(ReplayArgs),

    /// Show the label detected for an element
    Label(LabelArgs),

    /// Configuration management
    Config(ConfigArgs),
}
