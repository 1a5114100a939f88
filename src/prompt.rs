//! Prompt templates
//!
//! Pure functions so templates are unit-testable without any network access.

/// Instruction requesting semantically diverse reformulations of a question.
///
/// `target_count` is a hint to the model; the parser downstream never
/// assumes the reply honors it.
pub fn expansion_prompt(question: &str, target_count: usize) -> String {
    format!(
        "Generate {count} semantically diverse reformulations of the following \
         question, one per line, with no numbering and no commentary. Each \
         reformulation should target the same information need from a \
         different angle.\n\n\
         Question: {question}",
        count = target_count,
        question = question
    )
}

/// Grounded-answer instruction with the refusal contract.
///
/// The model must answer strictly from the supplied context; when the answer
/// is not derivable it must return the refusal phrase verbatim.
pub fn grounded_answer_prompt(context: &str, question: &str, refusal_message: &str) -> String {
    format!(
        "Answer the question based ONLY on the context below. Do not use any \
         prior knowledge. If the context does not contain the answer, reply \
         with exactly: {refusal}\n\n\
         Context:\n{context}\n\n\
         Question: {question}\n\n\
         Answer:",
        refusal = refusal_message,
        context = context,
        question = question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expansion_prompt_interpolation() {
        let prompt = expansion_prompt("What is ergonomics?", 5);
        assert!(prompt.contains("Generate 5 semantically diverse"));
        assert!(prompt.ends_with("Question: What is ergonomics?"));
    }

    #[test]
    fn test_grounded_answer_prompt_interpolation() {
        let prompt = grounded_answer_prompt("Some context.", "A question?", "I don't know.");
        assert!(prompt.contains("Context:\nSome context."));
        assert!(prompt.contains("Question: A question?"));
        assert!(prompt.contains("reply with exactly: I don't know."));
        assert!(prompt.ends_with("Answer:"));
    }
}
