use chrono::{DateTime, Utc};
use reviewkit_git::{short_commit, FileDiff};

use crate::Persona;

/// Checklist for manual review against the persona
pub const REVIEW_CHECKLIST: &str = r#"
# Code Review Checklist

Use this checklist when reviewing Python code:

## Documentation & Type Safety
- [ ] File header present with correct year: `Copyright {year}, [Your Organization].`
- [ ] All functions have complete type hints (params + return)
- [ ] Modern Python type syntax (`str | None`, `list[str]`)
- [ ] No `Any` types without justification
- [ ] Docstrings complete with Args and Returns sections

## Code Organization
- [ ] Absolute imports only (no relative imports)
- [ ] Magic numbers moved to constants at top of file
- [ ] StrEnums used for repeated string keys
- [ ] Private methods prefixed with `_`
- [ ] Unused imports removed

## Data Structures
- [ ] Dataclasses used instead of tuples for complex returns
- [ ] TypedDict or Pydantic for dictionary structures
- [ ] No "random dictionaries" being passed around

## Error Handling
- [ ] Specific exception handling (no bare `except:`)
- [ ] Consolidated exception handling where appropriate
- [ ] Edge cases handled (None, empty inputs)

## Code Style
- [ ] Complex ternaries broken into if/else
- [ ] No unnecessary f-strings
- [ ] No commented-out code
- [ ] Unused code removed

## Performance
- [ ] No unnecessary DataFrame copies
- [ ] Serialization costs considered
- [ ] Logger instantiation appropriate (not in tight loops/Ray tasks)

## Architecture
- [ ] Layer separation maintained (API vs module layer)
- [ ] Common logic pushed to templates where appropriate
- [ ] Hardcoded values moved to config

## Testing
- [ ] Test coverage for new functionality
- [ ] Bug fix tests reference ticket (IPLT-XXYY)
- [ ] Edge cases tested

## Questions to Consider
- [ ] "Do we need this?" - Is every addition necessary?
- [ ] "What if this is None?" - Edge cases covered?
- [ ] "Is this backwards compatible?" - Existing usage considered?
"#;

const REVIEW_OUTPUT_FORMAT: &str = r#"## Review Output Format

For each issue found, provide:
1. **File:Line** - The specific location
2. **Severity** - critical/warning/suggestion/question
3. **Issue** - What the problem is
4. **Suggestion** - How to fix it (with code example if helpful)

Organize by file, then by severity within each file."#;

/// Inputs for a full markdown review report
pub struct ReportInput<'a> {
    pub current_branch: &'a str,
    pub base_branch: &'a str,
    pub persona: &'a Persona,
    pub changed_files: &'a str,
    pub diff: &'a str,
    pub generated_at: DateTime<Utc>,
}

/// Prompt and report templates
pub struct ReviewPrompts;

impl ReviewPrompts {
    /// Header plus raw diff for the current branch
    pub fn branch_diff_summary(
        current_branch: &str,
        base_branch: &str,
        merge_base: &str,
        file_filter: &str,
        diff: &str,
    ) -> String {
        format!(
            r#"## Branch Diff Summary

**Current Branch:** {current}
**Base Branch:** {base}
**Merge Base:** {merge_base}
**Filter:** {filter}

---

{diff}
"#,
            current = current_branch,
            base = base_branch,
            merge_base = short_commit(merge_base),
            filter = file_filter,
            diff = diff,
        )
    }

    pub fn no_changes(file_filter: &str, base_branch: &str, current_branch: &str) -> String {
        format!(
            "No changes found in {} files between {} and {}.",
            file_filter, base_branch, current_branch
        )
    }

    /// Markdown list of changed files followed by `git diff --stat`
    pub fn changed_files(files: &[String], stat: &str) -> String {
        let list = files
            .iter()
            .map(|f| format!("- `{}`", f))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"## Changed Files ({count} files)

### Files:
{list}

### Statistics:
```
{stat}
```
"#,
            count = files.len(),
            list = list,
            stat = stat,
        )
    }

    pub fn no_changed_files(file_filter: &str) -> String {
        format!("No {} files changed.", file_filter)
    }

    /// One line per file: hunk count, line counts and hunk start lines
    pub fn file_overview(files: &FileDiff) -> String {
        files
            .iter()
            .map(|(path, hunks)| {
                let added: usize = hunks.iter().map(|h| h.additions.len()).sum();
                let removed: usize = hunks.iter().map(|h| h.deletions.len()).sum();
                let starts = hunks
                    .iter()
                    .map(|h| h.start_line.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                if hunks.is_empty() {
                    format!("- `{}`: no content changes", path)
                } else {
                    format!(
                        "- `{}`: {} hunk(s), +{} -{}, starting at line(s) {}",
                        path,
                        hunks.len(),
                        added,
                        removed,
                        starts
                    )
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Review request for a branch diff
    pub fn diff_review_request(
        persona: &Persona,
        focus_areas: &str,
        files: &FileDiff,
        diff: &str,
    ) -> String {
        format!(
            r#"
## Code Review Request

Please review the following diff using these standards:

{persona}

### Focus Areas: {focus}

### Files in this Diff:
{overview}

### Diff to Review:
{diff}

---

{format}
"#,
            persona = persona.content,
            focus = focus_areas,
            overview = Self::file_overview(files),
            diff = diff,
            format = REVIEW_OUTPUT_FORMAT,
        )
    }

    /// Review request for a single file, with line numbers
    pub fn file_review_request(persona: &Persona, file_path: &str, content: &str) -> String {
        format!(
            r#"
## Code Review Request - Single File

Please review this file using these standards:

{persona}

### File: `{path}`

```{lang}
{numbered}
```

---

## Review Output Format

For each issue found, provide:
1. **Line Number** - The specific line(s)
2. **Severity** - critical/warning/suggestion/question
3. **Issue** - What the problem is
4. **Suggestion** - How to fix it (with code example if helpful)

Start with a brief summary of the file's purpose, then list issues by severity.
"#,
            persona = persona.content,
            path = file_path,
            lang = fence_language(file_path),
            numbered = number_lines(content),
        )
    }

    pub fn persona_view(persona: &Persona) -> String {
        format!(
            "## Active Code Reviewer Persona\n\n**Source:** {}\n\n---\n\n{}\n",
            persona.source, persona.content
        )
    }

    pub fn checklist() -> &'static str {
        REVIEW_CHECKLIST
    }

    /// Full markdown report combining file list, persona, diff and checklist
    pub fn report(input: &ReportInput<'_>) -> String {
        format!(
            r#"# Code Review Report

**Branch:** {current}
**Base:** {base}
**Persona:** {persona_source}
**Generated:** {generated}

---

{changed}

---

## Review Standards

{persona}

---

## Diff to Review

{diff}

---

## Review Checklist

{checklist}
"#,
            current = input.current_branch,
            base = input.base_branch,
            persona_source = input.persona.source,
            generated = input.generated_at.to_rfc3339(),
            changed = input.changed_files,
            persona = input.persona.content,
            diff = input.diff,
            checklist = REVIEW_CHECKLIST,
        )
    }
}

/// Prefix each line with a right-aligned, 1-based line number
pub fn number_lines(content: &str) -> String {
    content
        .split('\n')
        .enumerate()
        .map(|(i, line)| format!("{:4} | {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// At most `max_chars` characters of `text`
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn fence_language(file_path: &str) -> &'static str {
    let ext = file_path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match ext {
        "py" => "python",
        "rs" => "rust",
        "js" => "javascript",
        "ts" => "typescript",
        "go" => "go",
        "java" => "java",
        "sh" => "bash",
        "toml" => "toml",
        "md" => "markdown",
        _ => "",
    }
}
