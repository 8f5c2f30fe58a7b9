/// In-memory state for the demo home screen: a greeting, a counter, and a
/// todo list. Nothing here survives a restart.

#[derive(Debug, Clone)]
pub struct Todo {
    pub id: u64,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Default)]
pub struct Home {
    pub count: i64,
    pub name: String,
    pub new_todo: String,
    todos: Vec<Todo>,
    next_id: u64,
}

impl Home {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn increment(&mut self) {
        self.count += 1;
    }

    pub fn decrement(&mut self) {
        self.count -= 1;
    }

    pub fn reset_count(&mut self) {
        self.count = 0;
    }

    /// Commits the todo draft. Whitespace-only input is a no-op, the same
    /// rule as chat submission.
    pub fn add_todo(&mut self) -> bool {
        let text = self.new_todo.trim();
        if text.is_empty() {
            return false;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.todos.push(Todo {
            id,
            text: text.to_string(),
            completed: false,
        });
        self.new_todo.clear();
        true
    }

    pub fn toggle_todo(&mut self, id: u64) {
        if let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) {
            todo.completed = !todo.completed;
        }
    }

    pub fn delete_todo(&mut self, id: u64) {
        self.todos.retain(|t| t.id != id);
    }
}
