use slotmap::new_key_type;

new_key_type! {
    /// Opaque identifier for a widget stored in the Core arena.
    pub struct WidgetId;
}

new_key_type! {
    /// Opaque identifier for a scheduled task.
    pub struct TaskId;
}
