mod test_remote_action_is_applied;
mod test_seek_debounce;
