use serde::Serialize;

use crate::model::task::Task;

/// JSON layout for a single task, matching the slot format
#[derive(Serialize)]
pub struct TaskJson<'a> {
    pub id: &'a str,
    pub title: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub description: &'a str,
    pub completed: bool,
}

pub fn task_to_json(task: &Task) -> TaskJson<'_> {
    TaskJson {
        id: &task.id,
        title: &task.title,
        description: &task.description,
        completed: task.completed,
    }
}

/// Human layout: position, checkbox, title, id, indented description
pub fn print_task_line(position: usize, task: &Task) {
    let mark = if task.completed { 'x' } else { ' ' };
    println!("{:>3}. [{}] {}  ({})", position, mark, task.title, task.id);
    if !task.description.is_empty() {
        println!("         {}", task.description);
    }
}
