//! Sample config command - print a commented configuration file

use sluice_config::SAMPLE_CONFIG;

/// Run the sample-config command
pub fn run() {
    print!("{SAMPLE_CONFIG}");
}
