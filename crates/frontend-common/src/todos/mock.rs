//! Fixed dataset served by `fetch_todos`

use super::state::TodoItem;

pub fn mock_todos() -> Vec<TodoItem> {
    [
        (1, "delectus aut autem", false),
        (2, "quis ut nam facilis et officia qui", false),
        (3, "fugiat veniam minus", false),
        (4, "et porro tempora", true),
        (5, "laboriosam mollitia...", false),
        (6, "qui ullam ratione...", false),
        (7, "illo expedita consequatur...", false),
        (8, "quo adipisci enim...", true),
        (9, "molestiae perspiciatis ipsa", false),
    ]
    .into_iter()
    .map(|(id, title, completed)| TodoItem {
        id,
        title: title.to_string(),
        completed,
    })
    .collect()
}
