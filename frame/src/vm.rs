use crate::{dump, Frame, FrameId, Tag, Value};
use utils::Error;

// host effect signature: every native word mutates the machine and reports
// fatal errors upward
pub type WordFn = fn(&mut Vm) -> Result<(), Error>;

// display name + host effect
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Word(pub &'static str, pub WordFn);

// What a dictionary write stores, decided by the caller at bind time: a
// host effect becomes a command frame (plain or immediate), anything else
// is stored as-is.
pub enum Binding {
    Cmd(Word),
    Immediate(Word),
    Frame(FrameId),
}

// One token per fetch, no lookahead, no backtracking. The machine holds the
// active source while an input is being interpreted so that vocabulary
// words can pull from the live stream.
pub trait TokenSource {
    fn token(&mut self) -> Result<Option<Frame>, Error>;
}

// The distinguished dictionary frame: its `slot` map is the global
// namespace, its `nest` is the data stack. It also owns the arena every
// frame lives in and a private stack of open aggregate builders, which
// survives across inputs.
pub struct Vm {
    frames: Vec<Frame>,
    root: FrameId,
    compile: Vec<FrameId>,
    source: Option<Box<dyn TokenSource>>,
}

impl Vm {
    pub fn new(name: &str) -> Vm {
        let mut vm = Vm {
            frames: vec![],
            root: 0,
            compile: vec![],
            source: None,
        };
        vm.root = vm.alloc(Frame::new(Tag::Vm, Value::Str(name.to_string())));
        vm.set("VM", vm.root);
        vm
    }

    pub fn alloc(&mut self, frame: Frame) -> FrameId {
        self.frames.push(frame);
        self.frames.len() - 1
    }

    pub fn frame(&self, id: FrameId) -> &Frame {
        &self.frames[id]
    }

    pub fn frame_mut(&mut self, id: FrameId) -> &mut Frame {
        &mut self.frames[id]
    }

    pub fn root(&self) -> FrameId {
        self.root
    }

    // data stack, delegated to the root frame's nest

    pub fn push(&mut self, id: FrameId) {
        let root = self.root;
        self.frames[root].push(id);
    }

    pub fn pop(&mut self) -> Result<FrameId, Error> {
        let root = self.root;
        self.frames[root].pop()
    }

    pub fn pip(&mut self) -> Result<FrameId, Error> {
        let root = self.root;
        self.frames[root].pip()
    }

    pub fn top(&self) -> Result<FrameId, Error> {
        self.frames[self.root].top()
    }

    pub fn tip(&self) -> Result<FrameId, Error> {
        self.frames[self.root].tip()
    }

    pub fn dup(&mut self) -> Result<(), Error> {
        let root = self.root;
        self.frames[root].dup()
    }

    pub fn drop_top(&mut self) -> Result<(), Error> {
        let root = self.root;
        self.frames[root].drop_top()
    }

    pub fn swap(&mut self) -> Result<(), Error> {
        let root = self.root;
        self.frames[root].swap()
    }

    pub fn over(&mut self) -> Result<(), Error> {
        let root = self.root;
        self.frames[root].over()
    }

    pub fn drop_all(&mut self) {
        let root = self.root;
        self.frames[root].drop_all();
    }

    pub fn depth(&self) -> usize {
        self.frames[self.root].depth()
    }

    pub fn stack(&self) -> &[FrameId] {
        self.frames[self.root].nest()
    }

    // dictionary, the root frame's slots

    pub fn get(&self, key: &str) -> Result<FrameId, Error> {
        self.frames[self.root].get(key)
    }

    pub fn set(&mut self, key: &str, id: FrameId) {
        let root = self.root;
        self.frames[root].set(key, id);
    }

    // keyed definition
    pub fn define(&mut self, key: &str, binding: Binding) -> FrameId {
        let id = self.materialize(binding);
        self.set(key, id);
        id
    }

    // name-keyed binding: the key is the bound thing's own name
    pub fn bind(&mut self, binding: Binding) -> FrameId {
        let id = self.materialize(binding);
        let key = self.frames[id].name();
        self.set(&key, id);
        id
    }

    fn materialize(&mut self, binding: Binding) -> FrameId {
        match binding {
            Binding::Cmd(word) => self.alloc(Frame::cmd(word, false)),
            Binding::Immediate(word) => self.alloc(Frame::cmd(word, true)),
            Binding::Frame(id) => id,
        }
    }

    // compile stack of open aggregate builders, innermost last

    pub fn compiling(&self) -> bool {
        !self.compile.is_empty()
    }

    pub fn open(&mut self, builder: Frame) {
        let id = self.alloc(builder);
        self.compile.push(id);
    }

    pub fn close(&mut self) -> Result<FrameId, Error> {
        self.compile.pop().ok_or(Error::MalformedAggregate)
    }

    pub fn inner(&self) -> Result<FrameId, Error> {
        self.compile.last().copied().ok_or(Error::MalformedAggregate)
    }

    // active token stream

    pub fn set_source(&mut self, source: Option<Box<dyn TokenSource>>) {
        self.source = source;
    }

    pub fn next_token(&mut self) -> Result<Option<Frame>, Error> {
        match self.source.as_mut() {
            Some(stream) => stream.token(),
            None => Ok(None),
        }
    }

    pub fn dump(&self, voc: bool) -> String {
        dump(&self.frames, self.root, voc)
    }

    pub fn dump_frame(&self, id: FrameId, voc: bool) -> String {
        dump(&self.frames, id, voc)
    }
}
