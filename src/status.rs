//! Status display sink

/// Something that can display a line of status text
pub trait StatusSink {
    fn set_text(&mut self, text: &str);
}

/// A plain string holds the most recent text
impl StatusSink for String {
    fn set_text(&mut self, text: &str) {
        self.clear();
        self.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_sink_keeps_last_text() {
        let mut sink = String::new();
        sink.set_text("Connected to server");
        sink.set_text("Received 1 events");
        assert_eq!(sink, "Received 1 events");
    }
}
