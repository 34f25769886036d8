use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Where a persona is looked for when none is given, relative to the repository root
pub const DEFAULT_PERSONA_PATH: &str = "notebooks/code_reviewer_persona.md";

/// Persona used when no persona file is available
pub const EMBEDDED_PERSONA: &str = r#"
# Code Review Standards

## Review Philosophy
Approach code review as a collaborative teaching moment, focusing on elevating
code quality and establishing team standards. Be thorough and educational.

## Key Review Patterns

### 1. Documentation & Type Safety (HIGH PRIORITY)
- Every file must have a copyright header: `Copyright {year}, [Your Organization].`
- Return type hints are MANDATORY
- Use modern syntax: `str | None` over `Optional[str]`, `list[str]` over `List[str]`
- Avoid `Any` type - use `object` instead
- Functions require complete docstrings with Args and Returns

### 2. Code Organization & Imports
- NO relative imports - always use absolute paths
- Remove unused imports immediately
- Move magic numbers to constants at the top of file
- Use `StrEnums` for string keys used across the codebase
- Private methods should be prefixed with `_`

### 3. Data Structures & Return Types
- Prefer dataclasses over tuples for complex returns
- No random dictionaries - use TypedDict or Pydantic models
- "Define a custom data class with these as fields, Try not to return tuples"

### 4. Error Handling
- Catch SPECIFIC exceptions only - no bare `except:`
- Consolidate similar exception handling to reduce duplication
- Functions should handle edge cases (empty inputs, None values)

### 5. Code Readability
- Avoid ternary operators for complex logic - use explicit if/else
- Remove unused code and imports
- Don't leave commented-out code
- Don't use f-strings when no variables are interpolated

### 6. Performance & Resource Management
- Be mindful of serialization/deserialization costs
- Avoid unnecessary DataFrame copies
- Be careful with logger instantiation in Ray tasks

### 7. Architecture Concerns
- Don't call API layer methods from module layer
- Push common logic to templates/base classes
- Move hardcoded values to app config

### 8. Critical Questions to Ask
- "Do we need this?" - Question necessity of every addition
- "What happens if this is None?" - Check edge cases
- "Is this backwards compatible?" - Consider existing usage
- "Under what situation would this fail?" - Boundary conditions

### 9. Testing Standards
- Add test cases for bug fixes with ticket reference (IPLT-XXYY)
- Test edge cases
- Don't hardcode test values - use config files

## Common Callouts (use these exact phrases when applicable)
- "Missing File header"
- "Return type hint missing"
- "Move Magic numbers to the top of file as constants"
- "Define a custom data class with these as fields, Try not to return tuples"
- "No general exceptions"
- "Try to avoid ternary ops - they make the code harder to read"
- "Do we need this?"
- "Unused" / "Remove"
- "No relative paths, always specify absolute path for imports"
"#;

/// Origin of the persona text in use
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonaSource {
    File(PathBuf),
    Embedded,
}

impl fmt::Display for PersonaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersonaSource::File(path) => write!(f, "{}", path.display()),
            PersonaSource::Embedded => write!(f, "embedded default"),
        }
    }
}

/// A reviewer persona document
#[derive(Debug, Clone)]
pub struct Persona {
    pub content: String,
    pub source: PersonaSource,
}

impl Persona {
    pub fn embedded() -> Self {
        Self {
            content: EMBEDDED_PERSONA.to_string(),
            source: PersonaSource::Embedded,
        }
    }

    /// Load a persona, falling back to the embedded default.
    ///
    /// Resolution order: `persona_file` (relative paths are resolved against
    /// `working_dir`), then [`DEFAULT_PERSONA_PATH`] under `repo_root` if it
    /// exists, then [`EMBEDDED_PERSONA`]. Unreadable files are logged and
    /// skipped.
    pub fn load(persona_file: Option<&Path>, working_dir: &Path, repo_root: Option<&Path>) -> Self {
        let candidate = match persona_file {
            Some(file) if file.is_absolute() => Some(file.to_path_buf()),
            Some(file) => Some(working_dir.join(file)),
            None => repo_root
                .map(|root| root.join(DEFAULT_PERSONA_PATH))
                .filter(|path| path.exists()),
        };

        let Some(path) = candidate else {
            return Self::embedded();
        };

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                info!(path = %path.display(), "Loaded persona");
                Self {
                    content,
                    source: PersonaSource::File(path),
                }
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read persona file, using embedded default"
                );
                Self::embedded()
            }
        }
    }
}
