use paper_budget::{
    apply_model_input_token_cap, build_conversation, estimate_available_context_budget,
    BudgetRequest, ConversationParts, ModelLimitTable,
};
use paper_protocol::{
    estimate_conversation_tokens, ChatMessage, ChatRole, ContentPart, MessageContent,
};
use proptest::prelude::*;

fn arb_message() -> impl Strategy<Value = ChatMessage> {
    (0u8..3, 0usize..6_000, 0usize..3, any::<bool>()).prop_map(|(role, len, images, ctx)| {
        let role = match role {
            0 => ChatRole::System,
            1 => ChatRole::User,
            _ => ChatRole::Assistant,
        };
        let mut text = "w".repeat(len);
        if ctx && role == ChatRole::System {
            text = format!("Document Context:\n{text}");
        }
        let content = if images == 0 {
            MessageContent::Text(text)
        } else {
            let mut parts = vec![ContentPart::text(text)];
            parts.extend((0..images).map(|i| ContentPart::image(format!("data:{i}"))));
            MessageContent::Parts(parts)
        };
        ChatMessage::new(role, content)
    })
}

proptest! {
    #[test]
    fn capping_never_increases_the_estimate(
        messages in prop::collection::vec(arb_message(), 1..8),
        cap in 200usize..6_000,
    ) {
        let before = estimate_conversation_tokens(&messages);
        let outcome = apply_model_input_token_cap(
            messages.clone(),
            "any-model",
            Some(cap),
            &ModelLimitTable::builtin(),
        );

        prop_assert_eq!(outcome.estimated_before_tokens, before);
        prop_assert_eq!(
            outcome.estimated_after_tokens,
            estimate_conversation_tokens(&outcome.messages)
        );
        prop_assert!(outcome.estimated_after_tokens <= before);
        if before <= outcome.soft_limit_tokens {
            prop_assert!(!outcome.capped);
            prop_assert_eq!(outcome.messages, messages);
        } else {
            prop_assert!(outcome.capped);
        }
    }
}

#[test]
fn planned_conversation_passes_the_cap_untouched() {
    let history = vec![
        ChatMessage::user("What dataset do they use?"),
        ChatMessage::assistant("They use a held-out benchmark."),
    ];
    let question = "How large is the improvement?";
    let request = BudgetRequest {
        system_prompt: "You answer questions about research papers.",
        history: &history,
        ..BudgetRequest::new("gpt-4o", question)
    };
    let limits = ModelLimitTable::builtin();
    let budget = estimate_available_context_budget(&request, &limits);

    // A context that uses the whole budget.
    let context = "e".repeat(budget.context_budget_tokens * 4);
    let messages = build_conversation(&ConversationParts {
        system_prompt: request.system_prompt,
        document_context: &context,
        history: &history,
        question,
        image_urls: &[],
    });
    let outcome = apply_model_input_token_cap(messages, "gpt-4o", None, &limits);

    assert!(!outcome.capped);
    assert!(outcome.estimated_after_tokens <= budget.soft_limit_tokens);
}
