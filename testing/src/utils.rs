pub fn is_send_sync<T: Send + Sync>(_: &T) -> bool {
    true
}

pub fn is_send<T: Send>(_: &T) -> bool {
    true
}
