/*!
 * # Editing Model
 *
 * The document model that reference widgets and every other inline item
 * live in.
 *
 * ## Architecture Overview
 *
 * ### 1. Blocks of Inline Content
 * - A **`Document`** is an ordered list of **`Block`**s (`paragraph`, `codeBlock`)
 * - Blocks hold **`Inline`** content: text runs and atomic **`InlineElement`**s
 * - An inline element occupies exactly one model offset, so the caret can
 *   only ever sit before or after it
 *
 * ### 2. Batched Changes
 * - All mutations run inside **`Document::change`** through a **`Writer`**
 * - A change is applied atomically: a failing closure rolls back content and selection
 * - Each successful change is one undo step
 *
 * ### 3. Command-Based Editing
 * - Plain edits are **`Cmd`** values applied with **`Document::apply`**
 * - Applying a command returns a **`Patch`** with the touched blocks,
 *   the new selection and the new version
 *
 * ## Module Structure
 *
 * - **`node`**: `Block`, `Inline`, `InlineElement`
 * - **`position`**: `Position`, `Parent`, `Selection`
 * - **`document`**: `Document`, `DocumentState`, `ModelError`
 * - **`writer`**: `Writer`, the mutation handle used inside changes
 * - **`commands`**: `Cmd` and how each command maps onto writer operations
 * - **`patch`**: edit result metadata
 *
 * ## Usage Pattern
 *
 * ```rust
 * use notelink_engine::editing::*;
 * use notelink_engine::schema::Schema;
 *
 * let schema = Schema::with_builtins();
 * let mut doc = Document::new();
 *
 * let patch = doc
 *     .apply(&schema, Cmd::InsertText { text: "Hello".to_string() })
 *     .unwrap();
 * assert_eq!(patch.new_selection, Selection::collapsed(Position::new(0, 5)));
 *
 * doc.apply(&schema, Cmd::SplitBlock).unwrap();
 * assert_eq!(doc.blocks().len(), 2);
 *
 * assert!(doc.undo());
 * assert_eq!(doc.text(), "Hello");
 * ```
 */

pub mod commands;
pub mod document;
pub mod node;
pub mod patch;
pub mod position;
pub mod writer;

pub use commands::Cmd;
pub use document::{Document, DocumentState, ModelError};
pub use node::{Attributes, Block, Inline, InlineElement};
pub use patch::Patch;
pub use position::{Parent, Position, Selection};
pub use writer::Writer;
