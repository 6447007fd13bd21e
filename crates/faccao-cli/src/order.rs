//! # Order Subcommand
//!
//! Read-only views of the transition policy, for support staff and for
//! checking front-end behaviour without a running service.
//!
//! - `transitions` - evaluate a status, optionally from one party's side.
//! - `table` - print every transition rule and derived action.

use std::io::Write;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use faccao_core::Party;
use faccao_state::{
    DerivedActionRule, OrderStatus, TransitionPolicy, TransitionResponse, TransitionRule,
};

use crate::output::{emit, OutputFormat, TextReport};

/// Arguments for the `faccao order` subcommand.
#[derive(Args, Debug)]
pub struct OrderArgs {
    #[command(subcommand)]
    pub command: OrderCommand,
}

#[derive(Subcommand, Debug)]
pub enum OrderCommand {
    /// Show what can happen next from a status.
    Transitions {
        /// Current status, e.g. QUALITY_REVIEW (case-insensitive).
        #[arg(long)]
        status: String,
        /// Evaluate from this party's side (brand or supplier).
        #[arg(long = "as")]
        viewer: Option<Party>,
    },

    /// Print the full transition table.
    Table,
}

/// Execute the order subcommand.
pub fn run_order(args: &OrderArgs, format: OutputFormat, out: &mut dyn Write) -> Result<u8> {
    let policy = TransitionPolicy::standard();
    match &args.command {
        OrderCommand::Transitions { status, viewer } => {
            cmd_transitions(&policy, status, *viewer, format, out)
        }
        OrderCommand::Table => cmd_table(&policy, format, out),
    }
}

fn parse_status(raw: &str) -> Result<OrderStatus> {
    let name = raw.trim().to_ascii_uppercase().replace(['-', ' '], "_");
    OrderStatus::from_name(&name).ok_or_else(|| {
        let known: Vec<&str> = OrderStatus::ALL.iter().map(|s| s.as_str()).collect();
        anyhow!("unknown status {raw:?}, expected one of {}", known.join(", "))
    })
}

impl TextReport for TransitionResponse {
    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "status:      {}", self.current_status)?;
        writeln!(out, "waiting:     {}", self.waiting_label)?;
        let waiting_for = self.waiting_for.map_or("nobody", |p| p.as_str());
        writeln!(out, "waiting for: {waiting_for}")?;
        writeln!(out, "can advance: {}", self.can_advance)?;
        if let Some(can_act) = self.viewer_can_act {
            writeln!(out, "your move:   {can_act}")?;
        }
        for t in &self.transitions {
            let marker = match t.available_to_viewer {
                Some(true) => "*",
                _ => " ",
            };
            writeln!(
                out,
                "{marker} -> {:<22} {:<9} {}{}",
                t.next_status.as_str(),
                t.initiated_by.as_str(),
                t.label,
                requirements(t.requires_confirmation, t.requires_notes, t.requires_review)
            )?;
        }
        for a in &self.derived_actions {
            writeln!(
                out,
                "  +  {:<22} {:<9} {}",
                "REWORK_ORDER",
                a.initiated_by.as_str(),
                a.label
            )?;
        }
        Ok(())
    }
}

fn requirements(confirmation: bool, notes: bool, review: bool) -> String {
    let flags: Vec<&str> = [(confirmation, "confirm"), (notes, "notes"), (review, "review")]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();
    if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    }
}

fn cmd_transitions(
    policy: &TransitionPolicy,
    status: &str,
    viewer: Option<Party>,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<u8> {
    let status = parse_status(status)?;
    let response = match viewer {
        Some(party) => policy.evaluate_for(status, party),
        None => policy.evaluate(status),
    };
    emit(&response, format, out)?;
    Ok(0)
}

#[derive(Debug, Serialize)]
pub struct TableReport {
    pub rules: Vec<&'static TransitionRule>,
    pub derived_actions: Vec<&'static DerivedActionRule>,
}

impl TextReport for TableReport {
    fn write_text(&self, out: &mut dyn Write) -> std::io::Result<()> {
        for r in &self.rules {
            writeln!(
                out,
                "{:<22} -> {:<22} {:<9} {}{}",
                r.from.as_str(),
                r.to.as_str(),
                r.initiated_by.as_str(),
                r.label,
                requirements(r.requires_confirmation, r.requires_notes, r.requires_review)
            )?;
        }
        for a in &self.derived_actions {
            writeln!(
                out,
                "{:<22} +  {:<22} {:<9} {}",
                a.from.as_str(),
                "REWORK_ORDER",
                a.initiated_by.as_str(),
                a.label
            )?;
        }
        Ok(())
    }
}

fn cmd_table(policy: &TransitionPolicy, format: OutputFormat, out: &mut dyn Write) -> Result<u8> {
    let report = TableReport {
        rules: OrderStatus::ALL
            .iter()
            .flat_map(|s| policy.rules_from(*s))
            .collect(),
        derived_actions: OrderStatus::ALL
            .iter()
            .flat_map(|s| policy.derived_actions_from(*s))
            .collect(),
    };
    emit(&report, format, out)?;
    Ok(0)
}
