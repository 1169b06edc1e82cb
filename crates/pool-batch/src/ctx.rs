use ambar_types::Event;

/// Per-block execution context handed in by the host: the block height and a
/// sink for typed events. The engine performs no other I/O through it.
#[derive(Debug, Default)]
pub struct Ctx {
    height: u64,
    events: Vec<Event>
}

impl Ctx {
    pub fn new(height: u64) -> Self {
        Self { height, events: Vec::new() }
    }

    pub fn block_height(&self) -> u64 {
        self.height
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
