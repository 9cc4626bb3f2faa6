//! Plain-text rendering of requests and accounts for the terminal.

use std::io::{self, Write};

use donation_desk_core::{Request, StatusSummary, User};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Write a one-line-per-request table. Writes a notice instead when empty.
pub fn write_table(out: &mut impl Write, requests: &[&Request]) -> io::Result<()> {
    if requests.is_empty() {
        return writeln!(out, "No requests to show.");
    }
    writeln!(
        out,
        "{:>4}  {:<16}  {:<28}  {:<9}  {:>5}",
        "ID", "Created", "Institution", "Status", "Items"
    )?;
    for request in requests {
        writeln!(
            out,
            "{:>4}  {:<16}  {:<28}  {:<9}  {:>5}",
            request.id.as_i32(),
            request.created_at.format(DATE_FORMAT).to_string(),
            request.institution_email.as_str(),
            request.status.as_str(),
            request.items.len()
        )?;
    }
    Ok(())
}

/// Write every field of a request, items included.
pub fn write_details(out: &mut impl Write, request: &Request) -> io::Result<()> {
    writeln!(out, "Request #{}", request.id)?;
    writeln!(out, "  Institution:   {}", request.institution_email)?;
    writeln!(out, "  Created:       {}", request.created_at.format(DATE_FORMAT))?;
    writeln!(out, "  Status:        {}", request.status)?;
    if let Some(reason) = &request.rejection_reason {
        writeln!(out, "  Reason:        {reason}")?;
    }
    writeln!(out, "  Justification: {}", request.justification)?;
    writeln!(out, "  Items:")?;
    for item in &request.items {
        writeln!(
            out,
            "    - {} x{} ({})",
            item.product_name, item.quantity, item.category
        )?;
    }
    Ok(())
}

/// Write one line per account. Secrets are never shown.
pub fn write_users(out: &mut impl Write, users: &[&User]) -> io::Result<()> {
    if users.is_empty() {
        return writeln!(out, "No users to show.");
    }
    writeln!(
        out,
        "{:>4}  {:<24}  {:<28}  {:<13}  {:<6}",
        "ID", "Name", "Email", "Role", "Active"
    )?;
    for user in users {
        writeln!(
            out,
            "{:>4}  {:<24}  {:<28}  {:<13}  {:<6}",
            user.id.as_i32(),
            user.name,
            user.email.as_str(),
            user.role.as_str(),
            if user.active { "yes" } else { "no" }
        )?;
    }
    Ok(())
}

/// Write the per-status counters shown at the top of the admin menu.
pub fn write_summary(out: &mut impl Write, summary: StatusSummary) -> io::Result<()> {
    writeln!(
        out,
        "Pending: {} | Approved: {} | Rejected: {} | Total: {}",
        summary.pending,
        summary.approved,
        summary.rejected,
        summary.total()
    )
}
