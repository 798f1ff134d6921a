use tasklist_core::db::migrations::latest_version;
use tasklist_core::db::open_store_in_memory;
use tasklist_core::{close_gaps, relinearize, SqliteTaskRepository, Task, TaskRepository};

#[test]
fn close_gaps_renumbers_after_a_delete() {
    let conn = open_store_in_memory(Some(latest_version())).unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    seed(&repo, &[("a", 0), ("b", 1), ("c", 2), ("d", 3)]);

    let deleted = repo
        .get_all()
        .unwrap()
        .into_iter()
        .find(|task| task.title == "b")
        .unwrap();
    repo.delete(deleted.id).unwrap();

    let mut survivors = repo.get_all().unwrap();
    let writes = close_gaps(&repo, &mut survivors).unwrap();

    assert_eq!(writes, 2, "the contiguous head must not be rewritten");
    assert_orders(&survivors, &[("a", 0), ("c", 1), ("d", 2)]);
    assert_orders(&repo.get_all().unwrap(), &[("a", 0), ("c", 1), ("d", 2)]);
}

#[test]
fn close_gaps_leaves_contiguous_lists_untouched() {
    let conn = open_store_in_memory(Some(latest_version())).unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    seed(&repo, &[("a", 0), ("b", 1), ("c", 2)]);

    let mut tasks = repo.get_all().unwrap();
    let writes = close_gaps(&repo, &mut tasks).unwrap();

    assert_eq!(writes, 0);
    assert_orders(&tasks, &[("a", 0), ("b", 1), ("c", 2)]);
}

#[test]
fn close_gaps_handles_leading_gap_and_drift() {
    let conn = open_store_in_memory(Some(latest_version())).unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    seed(&repo, &[("a", 2), ("b", 5), ("c", 9)]);

    let mut tasks = repo.get_all().unwrap();
    let writes = close_gaps(&repo, &mut tasks).unwrap();

    assert_eq!(writes, 3);
    assert_orders(&tasks, &[("a", 0), ("b", 1), ("c", 2)]);
    assert_orders(&repo.get_all().unwrap(), &[("a", 0), ("b", 1), ("c", 2)]);
}

#[test]
fn close_gaps_resolves_duplicate_orders_left_by_partial_reorder() {
    let conn = open_store_in_memory(Some(latest_version())).unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    // A write failure mid-relinearization can leave duplicate orders behind.
    seed(&repo, &[("a", 0), ("b", 1), ("c", 1), ("d", 2)]);

    let mut tasks = repo.get_all().unwrap();
    let writes = close_gaps(&repo, &mut tasks).unwrap();

    assert_eq!(writes, 2);
    let orders: Vec<i64> = tasks.iter().map(|task| task.order).collect();
    assert_eq!(orders, [0, 1, 2, 3]);
}

#[test]
fn relinearize_after_head_drag_rewrites_all_shifted_rows() {
    let conn = open_store_in_memory(Some(latest_version())).unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    seed(&repo, &[("a", 0), ("b", 1), ("c", 2), ("d", 3)]);

    // Drag "d" from position 3 to position 0.
    let mut sequence = arrange(&repo, &["d", "a", "b", "c"]);
    let writes = relinearize(&repo, &mut sequence).unwrap();

    assert_eq!(writes, 4);
    assert_orders(&sequence, &[("d", 0), ("a", 1), ("b", 2), ("c", 3)]);
    assert_orders(
        &repo.get_all().unwrap(),
        &[("d", 0), ("a", 1), ("b", 2), ("c", 3)],
    );
}

#[test]
fn relinearize_writes_only_rows_whose_position_changed() {
    let conn = open_store_in_memory(Some(latest_version())).unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    seed(&repo, &[("a", 0), ("b", 1), ("c", 2), ("d", 3)]);

    // Swap the middle neighbours; head and tail keep their positions.
    let mut sequence = arrange(&repo, &["a", "c", "b", "d"]);
    let writes = relinearize(&repo, &mut sequence).unwrap();

    assert_eq!(writes, 2);
    assert_orders(
        &repo.get_all().unwrap(),
        &[("a", 0), ("c", 1), ("b", 2), ("d", 3)],
    );
}

fn seed(repo: &SqliteTaskRepository<'_>, rows: &[(&str, i64)]) {
    for (title, order) in rows {
        repo.add(&Task::new(*title, 1_700_000_000_000, *order)).unwrap();
    }
}

fn arrange(repo: &SqliteTaskRepository<'_>, titles: &[&str]) -> Vec<Task> {
    let tasks = repo.get_all().unwrap();
    titles
        .iter()
        .map(|title| {
            tasks
                .iter()
                .find(|task| task.title == *title)
                .expect("seeded title")
                .clone()
        })
        .collect()
}

fn assert_orders(tasks: &[Task], expected: &[(&str, i64)]) {
    let actual: Vec<(&str, i64)> = tasks
        .iter()
        .map(|task| (task.title.as_str(), task.order))
        .collect();
    assert_eq!(actual, expected);
}
