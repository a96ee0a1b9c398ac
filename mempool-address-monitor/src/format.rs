// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Notification message formatting
//!
//! Messages use Telegram's HTML parse mode. Every interpolated value is
//! escaped, since aliases come from operator configuration.

const ORDISCAN_TX_URL: &str = "https://ordiscan.com/tx/";
const MEMPOOL_TX_URL: &str = "https://mempool.space/tx/";

/// Kind of event a message reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    New,
    Confirmed,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::New => "new",
            EventKind::Confirmed => "confirmed",
        }
    }

    fn header(&self) -> &'static str {
        match self {
            EventKind::New => "🚀 New unconfirmed transaction(s) for",
            EventKind::Confirmed => "✅ Confirmed transaction(s) for",
        }
    }
}

/// Render one message for a batch of transaction IDs of the same kind.
///
/// The header names the alias if one is configured, the raw address
/// otherwise. IDs are rendered in the order given.
pub fn format_message<'a>(
    address: &str,
    alias: Option<&str>,
    txids: impl IntoIterator<Item = &'a str>,
    kind: EventKind,
) -> String {
    let display_name = alias.unwrap_or(address);

    let lines: Vec<String> = txids.into_iter().map(format_tx_line).collect();

    format!(
        "{} <b>{}</b>:\n\n{}",
        kind.header(),
        escape_html(display_name),
        lines.join("\n\n")
    )
}

fn format_tx_line(txid: &str) -> String {
    let txid = escape_html(txid);
    format!(
        "<b>Transaction ID:</b> <code>{txid}</code>\n\
        <a href=\"{ORDISCAN_TX_URL}{txid}\">Ordiscan</a>, \
        <a href=\"{MEMPOOL_TX_URL}{txid}\">Mempool</a>"
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh";
    const TXID: &str = "4d3c1b0e9f2a8e7d6c5b4a39281706f5e4d3c2b1a0f9e8d7c6b5a49382716050";

    #[test]
    fn test_new_message_uses_alias() {
        let message = format_message(ADDRESS, Some("Cold Wallet"), [TXID], EventKind::New);
        assert!(message.starts_with("🚀 New unconfirmed transaction(s) for <b>Cold Wallet</b>:"));
        assert!(!message.contains(ADDRESS));
    }

    #[test]
    fn test_new_message_without_alias_uses_address() {
        let message = format_message(ADDRESS, None, [TXID], EventKind::New);
        assert!(message.starts_with(&format!(
            "🚀 New unconfirmed transaction(s) for <b>{}</b>:",
            ADDRESS
        )));
    }

    #[test]
    fn test_confirmed_message_uses_alias() {
        let message = format_message(ADDRESS, Some("Cold Wallet"), [TXID], EventKind::Confirmed);
        assert!(message.starts_with("✅ Confirmed transaction(s) for <b>Cold Wallet</b>:"));
    }

    #[test]
    fn test_confirmed_message_without_alias_uses_address() {
        let message = format_message(ADDRESS, None, [TXID], EventKind::Confirmed);
        assert!(message.starts_with(&format!(
            "✅ Confirmed transaction(s) for <b>{}</b>:",
            ADDRESS
        )));
    }

    #[test]
    fn test_transaction_lines_and_links() {
        let message = format_message(ADDRESS, None, ["aaa", "bbb"], EventKind::New);

        let expected_body = "<b>Transaction ID:</b> <code>aaa</code>\n\
            <a href=\"https://ordiscan.com/tx/aaa\">Ordiscan</a>, \
            <a href=\"https://mempool.space/tx/aaa\">Mempool</a>\n\n\
            <b>Transaction ID:</b> <code>bbb</code>\n\
            <a href=\"https://ordiscan.com/tx/bbb\">Ordiscan</a>, \
            <a href=\"https://mempool.space/tx/bbb\">Mempool</a>";
        assert!(message.ends_with(expected_body));
        assert!(message.find("aaa").unwrap() < message.find("bbb").unwrap());
    }

    #[test]
    fn test_deterministic() {
        let first = format_message(ADDRESS, Some("hot"), ["x", "y"], EventKind::Confirmed);
        let second = format_message(ADDRESS, Some("hot"), ["x", "y"], EventKind::Confirmed);
        assert_eq!(first, second);
    }

    #[test]
    fn test_alias_is_escaped() {
        let message = format_message(ADDRESS, Some("<Mine & Yours>"), [TXID], EventKind::New);
        assert!(message.contains("<b>&lt;Mine &amp; Yours&gt;</b>"));
    }
}
