//! Interactive text menu over a [`RateStore`].

use crate::cli::ui::{self, StyleType};
use crate::core::convert::{format_grouped, normalize_code};
use crate::core::provider::RateProvider;
use crate::core::rates::{PIVOT_CURRENCY, TIMESTAMP_FORMAT};
use crate::store::RateStore;
use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    Convert,
    ShowRates,
    Refresh,
    Exit,
}

impl MenuChoice {
    fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::Convert),
            "2" => Some(MenuChoice::ShowRates),
            "3" => Some(MenuChoice::Refresh),
            "4" => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

/// Prints `label` and reads one line; `None` at end of input.
fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> Result<Option<String>> {
    write!(output, "{label}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Runs the menu until the user exits or input ends.
pub async fn run_menu<P, R, W>(store: &mut RateStore<P>, input: &mut R, output: &mut W) -> Result<()>
where
    P: RateProvider,
    R: BufRead,
    W: Write,
{
    loop {
        writeln!(output, "\n{}", ui::style_text("Currency Converter", StyleType::Title))?;
        writeln!(output, "1. Convert currency")?;
        writeln!(output, "2. Show current rates")?;
        writeln!(output, "3. Update rates from API")?;
        writeln!(output, "4. Exit")?;

        let Some(raw_choice) = prompt(input, output, "\nChoose an option (1-4): ")? else {
            writeln!(output)?;
            break;
        };
        debug!(choice = %raw_choice, "Menu selection");

        match MenuChoice::parse(&raw_choice) {
            Some(MenuChoice::Convert) => {
                if !convert_interactive(store, input, output)? {
                    break;
                }
            }
            Some(MenuChoice::ShowRates) => display_rates(store, output)?,
            Some(MenuChoice::Refresh) => {
                let spinner = ui::new_spinner("Fetching latest rates...");
                let report = store.refresh().await;
                spinner.finish_and_clear();
                writeln!(output, "{report}")?;
            }
            Some(MenuChoice::Exit) => break,
            None => writeln!(
                output,
                "{}",
                ui::style_text("Invalid choice! Please try again.", StyleType::Error)
            )?,
        }
    }

    writeln!(output, "Thank you for using kurs!")?;
    Ok(())
}

/// Prompts for a conversion and prints the result. Returns `false` when input ended.
fn convert_interactive<P, R, W>(store: &RateStore<P>, input: &mut R, output: &mut W) -> Result<bool>
where
    P: RateProvider,
    R: BufRead,
    W: Write,
{
    let Some(raw_amount) = prompt(input, output, "Enter amount: ")? else {
        return Ok(false);
    };
    let amount = match raw_amount.parse::<f64>() {
        Ok(amount) if amount.is_finite() => amount,
        _ => {
            let message = format!("Error: invalid amount \"{raw_amount}\"");
            writeln!(output, "{}", ui::style_text(&message, StyleType::Error))?;
            return Ok(true);
        }
    };

    let Some(from) = prompt(input, output, "Enter source currency (e.g. USD): ")? else {
        return Ok(false);
    };
    let Some(to) = prompt(input, output, "Enter target currency (e.g. IDR): ")? else {
        return Ok(false);
    };

    match store.engine().convert(amount, &from, &to) {
        Ok(converted) => {
            let result = format!(
                "{} {} = {} {}",
                format_grouped(amount, 2),
                normalize_code(&from),
                format_grouped(converted, 2),
                normalize_code(&to)
            );
            writeln!(output, "\n{}", ui::style_text(&result, StyleType::Value))?;
        }
        Err(e) => {
            let message = format!("Error: {e}");
            writeln!(output, "{}", ui::style_text(&message, StyleType::Error))?;
        }
    }
    Ok(true)
}

/// Prints the main currencies against the pivot, as held by the store.
pub fn display_rates<P: RateProvider, W: Write>(store: &RateStore<P>, output: &mut W) -> Result<()> {
    writeln!(
        output,
        "\n{}",
        ui::style_text(
            &format!("Exchange rates against {PIVOT_CURRENCY}:"),
            StyleType::Label
        )
    )?;

    let last_update = store
        .last_update()
        .map_or("never".to_string(), |ts| ts.format(TIMESTAMP_FORMAT).to_string());
    let source = store
        .source()
        .map_or(String::new(), |source| format!(" (from {source})"));
    writeln!(
        output,
        "{}",
        ui::style_text(&format!("Last updated: {last_update}{source}"), StyleType::Subtle)
    )?;

    writeln!(output, "{}", ui::separator())?;
    for (code, rate) in store.engine().snapshot() {
        writeln!(output, "1 {PIVOT_CURRENCY} = {} {code}", format_grouped(rate, 4))?;
    }
    writeln!(output, "{}", ui::separator())?;

    let supported = store.supported_currencies();
    if !supported.is_empty() {
        let message = format!(
            "{} currencies available from the provider, {} with rates",
            supported.len(),
            store.rates().len()
        );
        writeln!(output, "{}", ui::style_text(&message, StyleType::Subtle))?;
    }
    Ok(())
}
