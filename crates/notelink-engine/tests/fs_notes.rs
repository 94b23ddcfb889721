mod common;

use std::rc::Rc;

use common::{local, reference_editor, wait_until, widget_texts};
use notelink_engine::cache::FsNoteSource;
use notelink_engine::reference::COMMAND_NAME;
use notelink_engine::{CommandArgs, NoteCache, ResourceCache, referenced_identifiers};
use tempfile::TempDir;

fn notes_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("projects")).unwrap();
    std::fs::write(
        dir.path().join("projects/roadmap.md"),
        "# Roadmap 2025\n\n- ship the editor\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("inbox.md"), "- [ ] triage\n").unwrap();
    dir
}

#[tokio::test]
async fn titles_come_from_markdown_headings() {
    local(async {
        let dir = notes_dir();
        let source = FsNoteSource::new(dir.path()).unwrap();
        let cache = Rc::new(NoteCache::new(Rc::new(source)));
        let editor = reference_editor(cache.clone());

        editor.set_data(concat!(
            r#"<p>Plan: <a class="reference-link" data-note-path="projects/roadmap"></a></p>"#,
            r#"<p>Todo: <a class="reference-link" data-note-path="inbox"></a></p>"#,
        ));
        wait_until(|| widget_texts(&editor).iter().all(|text| !text.is_empty())).await;

        assert_eq!(widget_texts(&editor), vec!["Roadmap 2025", "inbox"]);
        insta::assert_snapshot!(
            editor.get_data(),
            @r##"<p>Plan: <a href="#projects/roadmap" class="reference-link" data-note-path="projects/roadmap">Roadmap 2025</a></p><p>Todo: <a href="#inbox" class="reference-link" data-note-path="inbox">inbox</a></p>"##
        );
    })
    .await;
}

#[tokio::test]
async fn warming_referenced_notes_before_export() {
    local(async {
        let dir = notes_dir();
        let cache = Rc::new(NoteCache::new(Rc::new(
            FsNoteSource::new(dir.path()).unwrap(),
        )));
        let editor = reference_editor(cache.clone());
        editor.set_data("<p>Start</p>");
        editor
            .execute(
                COMMAND_NAME,
                CommandArgs::TargetPath("projects/roadmap".into()),
            )
            .await
            .unwrap();

        let identifiers = referenced_identifiers(&editor.model());
        assert_eq!(identifiers, vec!["roadmap"]);
        for identifier in &identifiers {
            cache.ensure_loaded(identifier).await.unwrap();
        }
        assert!(editor.get_data().contains(">Roadmap 2025</a>"));
    })
    .await;
}
