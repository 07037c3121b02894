// Scenarios command - built-in assistant questions

use crate::output::{print_table_header, print_table_row, OutputFormat};
use anyhow::Result;
use partbench_core::SCENARIOS;

pub fn run(output: OutputFormat) -> Result<()> {
    if !output.is_text() {
        return output.print_value(&SCENARIOS);
    }

    print_table_header(&[("KEY", 4), ("TITLE", 32), ("PROMPT", 60)]);
    for scenario in SCENARIOS {
        print_table_row(&[
            (scenario.key, 4),
            (scenario.title, 32),
            (scenario.prompt, 60),
        ]);
    }
    println!();
    println!("Run one with: partbench ask --scenario <KEY>");

    Ok(())
}
