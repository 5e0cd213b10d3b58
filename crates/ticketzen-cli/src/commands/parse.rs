//! Parser check commands

use anyhow::Result;
use ticketzen_core::{parse_amount_fr, parse_date_fr};

pub fn cmd_parse_amount(text: &str) -> Result<()> {
    match parse_amount_fr(text) {
        Some(amount) => println!("{:.2}", amount),
        None => println!("unparseable amount: {:?}", text),
    }
    Ok(())
}

pub fn cmd_parse_date(text: &str) -> Result<()> {
    match parse_date_fr(text) {
        Some(date) => println!("{}", date.format("%Y-%m-%d")),
        None => println!("unparseable date: {:?}", text),
    }
    Ok(())
}
