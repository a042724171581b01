// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply context assembly.

use waworker_core::traits::{HistoryEntry, ReplyContext};
use waworker_core::types::BotConfig;

/// Fixed rules sent with every responder invocation. Channel owners
/// control knowledge and persona; these rails are not theirs to edit.
pub const SYSTEM_RULES: &str = "\
You are answering WhatsApp messages on behalf of a business. \
Answer only from the product details provided; if the answer is not \
there, say you will check and get back to them. Reply in the language \
the customer wrote in. Keep replies short and conversational. Never \
mention that you are automated unless asked directly.";

/// Build the responder context for one inbound message.
pub fn build_context(
    config: &BotConfig,
    history: Vec<HistoryEntry>,
    inbound_text: &str,
) -> ReplyContext {
    ReplyContext {
        system_rules: SYSTEM_RULES.to_string(),
        product_details: config.product_details.clone(),
        sales_strategy: config.sales_strategy.clone(),
        history,
        inbound_text: inbound_text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_carries_config_knowledge() {
        let config = BotConfig {
            enabled: true,
            product_details: "Handmade pottery, ships nationwide".into(),
            sales_strategy: "Friendly, close fast".into(),
            ..BotConfig::default()
        };
        let ctx = build_context(&config, vec![], "do you ship to Recife?");
        assert_eq!(ctx.product_details, "Handmade pottery, ships nationwide");
        assert_eq!(ctx.sales_strategy, "Friendly, close fast");
        assert_eq!(ctx.inbound_text, "do you ship to Recife?");
        assert!(ctx.system_rules.contains("product details"));
    }
}
