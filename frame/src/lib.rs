use fnv::FnvHashMap;
use std::fmt::Display;
use utils::Error;

#[cfg(not(target_os = "linux"))]
use mimalloc::MiMalloc;

#[cfg(not(target_os = "linux"))]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

pub mod vm;

pub use vm::{Binding, TokenSource, Vm, Word, WordFn};

// Frames live in one arena owned by the Vm; every edge between frames is an
// index into it. Identity is the id, so `dup` and dictionary bindings share
// structure instead of copying, and cyclic slots are plain index writes.
pub type FrameId = usize;

#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
#[repr(u8)]
pub enum Tag {
    // scalars
    Symbol,
    Str,
    Num,
    Int,
    Hex,
    Bin,
    // containers
    Vector,
    Seq,
    // active
    Vm,
    Cmd,
    // inert wrappers
    Dir,
    File,
    Url,
    Email,
    Module,
    Lang,
    Title,
    Author,
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tag::Symbol => "symbol",
            Tag::Str => "string",
            Tag::Num => "number",
            Tag::Int => "integer",
            Tag::Hex => "hex",
            Tag::Bin => "bin",
            Tag::Vector => "vector",
            Tag::Seq => "seq",
            Tag::Vm => "vm",
            Tag::Cmd => "cmd",
            Tag::Dir => "dir",
            Tag::File => "file",
            Tag::Url => "url",
            Tag::Email => "email",
            Tag::Module => "module",
            Tag::Lang => "lang",
            Tag::Title => "title",
            Tag::Author => "author",
        };
        write!(f, "{}", name)
    }
}

// The scalar payload of a frame. Hex/Bin store a plain integer; their radix
// lives in the tag and only matters for rendering. Anonymous containers
// carry an empty string.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Num(f64),
    Word(Word),
}

#[derive(Debug, Clone)]
pub struct Frame {
    tag: Tag,
    value: Value,
    nest: Vec<FrameId>,
    slot: FnvHashMap<String, FrameId>,
    pub immediate: bool,
}

impl Frame {
    pub fn new(tag: Tag, value: Value) -> Frame {
        Frame {
            tag,
            value,
            nest: vec![],
            slot: FnvHashMap::default(),
            immediate: false,
        }
    }

    // any string-valued frame: containers, wrappers, markers
    pub fn named(tag: Tag, name: &str) -> Frame {
        Frame::new(tag, Value::Str(name.to_string()))
    }

    pub fn symbol(text: &str) -> Frame {
        Frame::named(Tag::Symbol, text)
    }

    pub fn string(text: &str) -> Frame {
        Frame::named(Tag::Str, text)
    }

    pub fn vector(name: &str) -> Frame {
        Frame::named(Tag::Vector, name)
    }

    pub fn seq(name: &str) -> Frame {
        Frame::named(Tag::Seq, name)
    }

    pub fn number(value: f64) -> Frame {
        Frame::new(Tag::Num, Value::Num(value))
    }

    pub fn integer(value: i64) -> Frame {
        Frame::new(Tag::Int, Value::Int(value))
    }

    pub fn hex(value: i64) -> Frame {
        Frame::new(Tag::Hex, Value::Int(value))
    }

    pub fn bin(value: i64) -> Frame {
        Frame::new(Tag::Bin, Value::Int(value))
    }

    pub fn cmd(word: Word, immediate: bool) -> Frame {
        let mut f = Frame::new(Tag::Cmd, Value::Word(word));
        f.immediate = immediate;
        f
    }

    // construction from a source frame copies its exposed value and nest
    pub fn from_frame(tag: Tag, source: &Frame) -> Frame {
        Frame {
            tag,
            value: source.value.clone(),
            nest: source.nest.clone(),
            slot: FnvHashMap::default(),
            immediate: false,
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    // plain string form of the scalar; this is what slot keys are made of
    pub fn name(&self) -> String {
        match &self.value {
            Value::Str(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Num(n) => format!("{:?}", n),
            Value::Word(w) => w.0.to_string(),
        }
    }

    // display form; Hex/Bin render through the radix they were written in
    pub fn literal(&self) -> String {
        match (self.tag, &self.value) {
            (Tag::Hex, Value::Int(i)) => format!("{:#x}", i),
            (Tag::Bin, Value::Int(i)) => format!("{:#b}", i),
            _ => self.name(),
        }
    }

    // stack protocol over `nest`: tail is the top; `pip`/`tip` address the
    // second-from-top element directly

    pub fn push(&mut self, id: FrameId) {
        self.nest.push(id);
    }

    pub fn pop(&mut self) -> Result<FrameId, Error> {
        self.nest.pop().ok_or(Error::EmptyStack)
    }

    pub fn pip(&mut self) -> Result<FrameId, Error> {
        if self.nest.len() < 2 {
            Err(Error::EmptyStack)
        } else {
            let second = self.nest.len() - 2;
            Ok(self.nest.remove(second))
        }
    }

    pub fn top(&self) -> Result<FrameId, Error> {
        self.nest.last().copied().ok_or(Error::EmptyStack)
    }

    pub fn tip(&self) -> Result<FrameId, Error> {
        if self.nest.len() < 2 {
            Err(Error::EmptyStack)
        } else {
            Ok(self.nest[self.nest.len() - 2])
        }
    }

    pub fn drop_all(&mut self) {
        self.nest.clear();
    }

    pub fn dup(&mut self) -> Result<(), Error> {
        let top = self.top()?;
        self.push(top);
        Ok(())
    }

    pub fn drop_top(&mut self) -> Result<(), Error> {
        self.pop().map(|_| ())
    }

    // push(pip()): the two top elements exchange order
    pub fn swap(&mut self) -> Result<(), Error> {
        let second = self.pip()?;
        self.push(second);
        Ok(())
    }

    // push(tip()): duplicate the second-from-top onto the top
    pub fn over(&mut self) -> Result<(), Error> {
        let second = self.tip()?;
        self.push(second);
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.nest.len()
    }

    pub fn nest(&self) -> &[FrameId] {
        &self.nest
    }

    // slot protocol: string keys, unique, last writer wins

    pub fn get(&self, key: &str) -> Result<FrameId, Error> {
        self.slot
            .get(key)
            .copied()
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    pub fn set(&mut self, key: &str, id: FrameId) {
        self.slot.insert(key.to_string(), id);
    }

    pub fn slots(&self) -> &FnvHashMap<String, FrameId> {
        &self.slot
    }
}

// Cycle-safe debug rendering: one line per frame, children indented, a
// frame already rendered in this traversal gets a `_/` mark and is not
// descended into again. Slot keys print in sorted order; the map iteration
// order is unstable and slot order carries no meaning.
pub fn dump(frames: &[Frame], root: FrameId, voc: bool) -> String {
    let mut seen = vec![];
    let mut out = String::new();
    dump_frame(frames, root, 0, "", voc, &mut seen, &mut out);
    out
}

fn dump_frame(
    frames: &[Frame], id: FrameId, depth: usize, prefix: &str, voc: bool, seen: &mut Vec<FrameId>,
    out: &mut String,
) {
    let frame = &frames[id];
    out.push('\n');
    for _ in 0..depth {
        out.push_str("    ");
    }
    out.push_str(prefix);
    out.push_str(&format!("<{}:{}> @{:x}", frame.tag(), frame.literal(), id));
    if seen.contains(&id) {
        out.push_str(" _/");
        return;
    }
    seen.push(id);
    if voc {
        let mut keys: Vec<&String> = frame.slot.keys().collect();
        keys.sort();
        for key in keys {
            let label = format!("{} = ", key);
            dump_frame(frames, frame.slot[key], depth + 1, &label, voc, seen, out);
        }
    }
    for &child in &frame.nest {
        dump_frame(frames, child, depth + 1, "", voc, seen, out);
    }
}
