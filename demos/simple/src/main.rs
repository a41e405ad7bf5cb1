use futures::executor::{block_on, LocalPool};
use std::sync::Arc;
use std::time::Duration;
use view_filter::describe::PlainCodec;
use view_filter::filter_core::{ColumnRef, Operator, ViewId};
use view_filter::scheduler::ManualClock;
use view_filter::service::{MemoryCatalog, MemoryViewService};
use view_filter::{FilterEditor, FilterEditorConfig};

const VIEW: ViewId = ViewId(1);

fn main() {
    let name = ColumnRef::new(0);
    let count = ColumnRef::new(1);
    let catalog = MemoryCatalog::new()
        .with_column(name, "Name")
        .with_column(count, "Count");
    let service = Arc::new(MemoryViewService::new().with_view(VIEW, vec![]));

    let mut pool = LocalPool::new();
    let clock = ManualClock::new();
    let mut editor = match block_on(FilterEditor::open(
        VIEW,
        service.clone(),
        FilterEditorConfig::default(),
        clock.clone(),
        pool.spawner(),
    )) {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("cannot open view: {e}");
            return;
        }
    };

    let first = editor.filters()[0].key;
    let _ = editor.edit_leaf(first, |leaf| {
        leaf.with_column(name).with_operator(Operator::Like)
    });
    // One keystroke every 50 ms
    let mut typed = String::new();
    for c in "Default_1".chars() {
        typed.push(c);
        let _ = editor.edit_leaf(first, |leaf| leaf.with_user_value(&typed));
        clock.advance(Duration::from_millis(50));
        editor.poll();
        pool.run_until_stalled();
    }

    let _ = editor.add();
    let second = editor.filters()[1].key;
    let _ = editor.edit_leaf(second, |leaf| {
        leaf.with_column(count)
            .with_operator(Operator::GtEq)
            .with_user_value("500")
    });

    while editor.next_deadline().is_some() {
        clock.advance(editor.config().cooldown());
        editor.poll();
        pool.run_until_stalled();
    }

    for (i, (_, filters)) in service.saves().iter().enumerate() {
        println!("save #{i}: {} filters", filters.len());
    }
    match editor.describe(&catalog, &PlainCodec) {
        Ok(text) => println!("showing rows where {text}"),
        Err(e) => eprintln!("cannot describe filters: {e}"),
    }
}
