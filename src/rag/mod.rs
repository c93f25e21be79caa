//! RAG pipeline helpers
//!
//! Loads markdown documents, strips markup to plain text, ingests them into
//! a server-side vector database, and retrieves chunks for a question. The
//! embedding and vector search live entirely on the stack; this module only
//! prepares inputs and assembles the retrieved context.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::client::{Document, StackClient};
use crate::core::config::RagConfig;
use crate::core::{Result, StackchatError};

/// Find all markdown files under a directory, recursively
///
/// Results are sorted so document ids are stable across runs.
pub fn find_markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_markdown_files(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_markdown_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_markdown_files(&path, files)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("md") {
            files.push(path);
        }
    }
    Ok(())
}

/// Strip markdown markup, keeping the readable text
///
/// Removes code fences, heading and blockquote markers, list bullets,
/// horizontal rules, bold markers, and backticks; links and images are
/// replaced by their text. Content inside fenced blocks is kept verbatim.
pub fn strip_markdown(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_code_block = false;

    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }
        if in_code_block {
            out.push_str(line);
            out.push('\n');
            continue;
        }

        // Horizontal rules and setext underlines
        if trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-' || c == '=' || c == '*') {
            continue;
        }

        let text = trimmed.trim_start_matches('#').trim_start();
        let text = text.strip_prefix("> ").unwrap_or(text);
        let text = text
            .strip_prefix("- ")
            .or_else(|| text.strip_prefix("* "))
            .or_else(|| text.strip_prefix("+ "))
            .unwrap_or(text);

        let mut cleaned = strip_links(text).replace("**", "");
        cleaned.retain(|c| c != '`');

        out.push_str(cleaned.trim_end());
        out.push('\n');
    }

    out.trim().to_string()
}

/// Replace `[text](url)` and `![alt](url)` with their text
fn strip_links(mut line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    loop {
        let Some(mid) = line.find("](") else {
            out.push_str(line);
            return out;
        };

        let open = line[..mid].rfind('[');
        let close = line[mid + 2..].find(')');
        match (open, close) {
            (Some(open), Some(close)) => {
                let mut prefix = &line[..open];
                if prefix.ends_with('!') {
                    prefix = &prefix[..prefix.len() - 1];
                }
                out.push_str(prefix);
                out.push_str(&line[open + 1..mid]);
                line = &line[mid + 2 + close + 1..];
            }
            _ => {
                // "](" without link structure; pass it through
                out.push_str(&line[..mid + 2]);
                line = &line[mid + 2..];
            }
        }
    }
}

/// Load every markdown file under a directory as a plain-text document
///
/// Empty files are skipped; document ids are `doc-1`, `doc-2`, ... in
/// sorted path order.
pub fn load_documents(docs_dir: &Path) -> Result<Vec<Document>> {
    let mut documents = Vec::new();

    for (i, path) in find_markdown_files(docs_dir)?.into_iter().enumerate() {
        let contents = std::fs::read_to_string(&path)?;
        let plain_text = strip_markdown(&contents);
        if plain_text.is_empty() {
            continue;
        }

        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        documents.push(Document {
            document_id: format!("doc-{}", i + 1),
            content: plain_text,
            mime_type: "text/plain".to_string(),
            metadata: serde_json::json!({
                "source": path.to_string_lossy(),
                "title": title,
            }),
        });
    }

    Ok(documents)
}

/// Ingest the configured docs directory into a fresh vector database
///
/// Picks the first `vector_io` provider the stack serves, registers a
/// uuid-suffixed database, and inserts the documents with server-side
/// chunking. Returns the new database id; the caller owns its lifetime and
/// should unregister it when done.
pub async fn ingest(client: &StackClient, config: &RagConfig) -> Result<String> {
    let providers = client.list_providers().await?;
    let provider = providers
        .into_iter()
        .find(|p| p.api == "vector_io")
        .ok_or_else(|| StackchatError::config("no vector_io provider available on the stack"))?;

    let vector_db_id = format!("stackchat-rag-{}", Uuid::new_v4());
    client
        .register_vector_db(
            &vector_db_id,
            &provider.provider_id,
            &config.embedding_model,
            config.embedding_dimension,
        )
        .await?;

    let documents = load_documents(Path::new(&config.docs_dir))?;
    if documents.is_empty() {
        return Err(StackchatError::config(format!(
            "no markdown documents found under {}",
            config.docs_dir
        )));
    }

    println!(
        "Ingesting {} documents into {}",
        documents.len(),
        vector_db_id
    );
    client
        .rag_insert(&documents, &vector_db_id, config.chunk_size_in_tokens)
        .await?;

    Ok(vector_db_id)
}

/// Retrieve the chunks relevant to a question
pub async fn retrieve(
    client: &StackClient,
    question: &str,
    vector_db_id: &str,
) -> Result<Vec<String>> {
    client
        .rag_query(question, &[vector_db_id.to_string()])
        .await
}

/// Build the context-stuffed prompt for a retrieved question
pub fn build_context_prompt(question: &str, chunks: &[String]) -> String {
    format!(
        "Answer the question based only on the context provided\n\
         <question>{}</question>\n\
         <context>{}</context>",
        question,
        chunks.join(" ")
    )
}
