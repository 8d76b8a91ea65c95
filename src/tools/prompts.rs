use crate::rag::Document;

/// `Doc 1 (page 5): ...` blocks separated by blank lines.
pub fn document_blocks(docs: &[Document]) -> String {
    docs.iter()
        .enumerate()
        .map(|(i, doc)| format!("Doc {} (page {}): {}", i + 1, doc.page_label(), doc.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn review_prompt(docs: &[Document]) -> String {
    format!(
        r#"You are a research assistant. Evaluate the following sources for:
- clarity
- relevance to the research question
- reliability of content

{blocks}

Write a concise review and flag weak or unclear sections."#,
        blocks = document_blocks(docs)
    )
}

pub fn structured_validation_prompt(docs: &[Document]) -> String {
    format!(
        r#"You are a research assistant.

Evaluate the following {count} documents for:
- clarity
- relevance to the research question
- credibility of content

Keep only the documents that pass. Never add documents that are not listed below.

Return ONLY a valid JSON object of the form:
{{
  "filtered": [
    {{
      "content": "...",
      "metadata": {{ "doc": "Doc 1", "page": 5 }}
    }}
  ],
  "commentary": "..."
}}

Do not include any markdown, code blocks, or extra commentary. Output only a JSON object.

{blocks}"#,
        count = docs.len(),
        blocks = document_blocks(docs)
    )
}

pub fn synthesis_prompt(combined_text: &str) -> String {
    format!(
        r#"You are a research assistant helping synthesize insights from provided documents.

Based on the content below, write a concise, structured answer to the user's research question.
Your output should:
- Address the key themes and findings relevant to the question
- Be clear, informative, and suitable for professional use
- Include supporting context where appropriate

Documents:
{combined_text}"#
    )
}
