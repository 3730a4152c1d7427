//! Interactive filter loop over the scanned snapshot
//!
//! The snapshot is built once before the loop starts and never changes;
//! every answer is computed from it, and only MAC resolution talks to the
//! switches again.

use crate::{App, print};
use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use vlanscope_core::query::{self, QueryResult, VlanFilter};

const FILTER_PROMPT: &str = "Filter by VLAN ID (or type 'exit' to quit, 'all' for all VLANs): ";
const RESOLVE_PROMPT: &str = "Extract MAC addresses for these ports? Y/N: ";

/// What the operator typed at the filter prompt.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Exit,
    Filter(VlanFilter),
}

/// Anything but `exit` is a filter; a blank line is a VLAN id that never
/// matches, so it answers with the VLAN counts.
fn parse_command(line: &str) -> Command {
    let input = line.trim();
    if input.eq_ignore_ascii_case("exit") {
        Command::Exit
    } else {
        Command::Filter(VlanFilter::parse(input))
    }
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// Run the filter loop until `exit` or end of input.
pub async fn run(app: &App) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let Some(line) = prompt(&mut lines, FILTER_PROMPT).await? else {
            break;
        };

        let filter = match parse_command(&line) {
            Command::Exit => {
                println!("Exiting vlanscope. Goodbye!");
                break;
            }
            Command::Filter(filter) => filter,
        };

        match query::query(&app.inventory, &filter) {
            QueryResult::NoMatch(counts) => print::vlan_counts(app.format, &filter, &counts),
            result => {
                let ports = result.assignments().unwrap_or_default();
                print::match_header(app.format, &filter, ports.len());

                let Some(answer) = prompt(&mut lines, RESOLVE_PROMPT).await? else {
                    break;
                };
                if is_yes(&answer) {
                    app.resolve_and_print(&ports).await;
                } else {
                    print::assignments(app.format, &ports);
                }
            }
        }
    }

    Ok(())
}

/// Print `text` without a newline and read one line; `None` on end of input.
async fn prompt(lines: &mut Lines<BufReader<Stdin>>, text: &str) -> Result<Option<String>> {
    print!("{text}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("exit"), Command::Exit);
        assert_eq!(parse_command("  EXIT \n"), Command::Exit);
        assert_eq!(
            parse_command("   "),
            Command::Filter(VlanFilter::Vlan(String::new()))
        );
        assert_eq!(parse_command("all"), Command::Filter(VlanFilter::All));
        assert_eq!(
            parse_command("120"),
            Command::Filter(VlanFilter::Vlan("120".to_string()))
        );
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes(" Y\n"));
        assert!(!is_yes("yes"));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
    }
}
