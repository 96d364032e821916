use crate::word;
use frame::{Binding, Frame, Tag, Vm, Word};
use std::process;
use utils::Error;

// The boot vocabulary. Keys follow the surface syntax; display names stay
// with the host effect, so `.` dumps as <cmd:DOT>.
pub fn install(vm: &mut Vm) {
    // debug
    vm.bind(Binding::Cmd(Word("BYE", bye)));
    vm.define("?", Binding::Immediate(Word("Q", q)));
    vm.define("??", Binding::Immediate(Word("QQ", qq)));

    // stack operations
    vm.define(".", Binding::Cmd(Word("DOT", dot)));
    vm.bind(Binding::Cmd(Word("DUP", dup)));
    vm.bind(Binding::Cmd(Word("DROP", drop)));
    vm.bind(Binding::Cmd(Word("SWAP", swap)));
    vm.bind(Binding::Cmd(Word("OVER", over)));

    // frame manipulation
    vm.define("=", Binding::Cmd(Word("EQ", eq)));
    vm.define("<<", Binding::Cmd(Word("LSHIFT", lshift)));
    vm.define("//", Binding::Cmd(Word("PUSH", push)));
    vm.define("/<", Binding::Cmd(Word("ATTR", attr)));
    vm.define("/@", Binding::Cmd(Word("rFETCH", r_fetch)));
    vm.define("/=", Binding::Cmd(Word("STOR", stor)));

    // metaprogramming
    vm.bind(Binding::Cmd(Word("MODULE", module)));

    // token stream
    vm.define("`", Binding::Cmd(Word("QUOTE", quote)));

    // compiling words run even inside an open aggregate
    vm.define("REC", Binding::Immediate(Word("REC", rec)));
    vm.define("[", Binding::Immediate(Word("LQ", lq)));
    vm.define("]", Binding::Immediate(Word("RQ", rq)));
    vm.define("{", Binding::Immediate(Word("LC", lc)));
    vm.define("}", Binding::Immediate(Word("RC", rc)));

    // i/o and network wrappers
    vm.bind(Binding::Cmd(Word("DIR", dir)));
    vm.bind(Binding::Cmd(Word("FILE", file)));
    vm.define("URL", Binding::Cmd(Word("URL", url)));
    vm.define("EMAIL", Binding::Cmd(Word("EMAIL", email)));

    // documenting
    vm.define(".title", Binding::Cmd(Word("dotTITLE", dot_title)));
    vm.define(".author", Binding::Cmd(Word("dotAUTHOR", dot_author)));

    // language markers
    let forth = vm.alloc(Frame::named(Tag::Lang, "FORTH"));
    vm.define("FORTH", Binding::Frame(forth));
    let own = vm.alloc(Frame::named(Tag::Lang, "minsky"));
    vm.define("minsky", Binding::Frame(own));
}

// debug

fn bye(_vm: &mut Vm) -> Result<(), Error> {
    process::exit(0)
}

// dump the data stack
fn q(vm: &mut Vm) -> Result<(), Error> {
    println!("{}", vm.dump(false));
    Ok(())
}

// dump the whole machine, vocabulary included, and stop
fn qq(vm: &mut Vm) -> Result<(), Error> {
    println!("{}", vm.dump(true));
    process::exit(0)
}

// stack operations

// `.` clears the stack, it does not print
fn dot(vm: &mut Vm) -> Result<(), Error> {
    vm.drop_all();
    Ok(())
}

fn dup(vm: &mut Vm) -> Result<(), Error> {
    vm.dup()
}

fn drop(vm: &mut Vm) -> Result<(), Error> {
    vm.drop_top()
}

fn swap(vm: &mut Vm) -> Result<(), Error> {
    vm.swap()
}

fn over(vm: &mut Vm) -> Result<(), Error> {
    vm.over()
}

// frame manipulation

// ( what name -- ) bind what under the name, on the machine itself
fn eq(vm: &mut Vm) -> Result<(), Error> {
    let addr = vm.pop()?;
    let what = vm.pop()?;
    let key = vm.frame(addr).name();
    vm.set(&key, what);
    Ok(())
}

// ( dst that -- dst ) bind that into dst under its own name
fn lshift(vm: &mut Vm) -> Result<(), Error> {
    let dst = vm.pip()?;
    let that = vm.pop()?;
    let key = vm.frame(that).name();
    vm.frame_mut(dst).set(&key, that);
    vm.push(dst);
    Ok(())
}

// ( what dst -- dst ) nest what into the frame on top
fn push(vm: &mut Vm) -> Result<(), Error> {
    let what = vm.pip()?;
    let dst = vm.top()?;
    vm.frame_mut(dst).push(what);
    Ok(())
}

// ( dst what place -- dst ) keyed write into the frame on top
fn attr(vm: &mut Vm) -> Result<(), Error> {
    let place = vm.pop()?;
    let what = vm.pop()?;
    let dst = vm.top()?;
    let key = vm.frame(place).name();
    vm.frame_mut(dst).set(&key, what);
    Ok(())
}

// ( src place -- src[place] ) pop a frame and fetch one of its slots
fn r_fetch(vm: &mut Vm) -> Result<(), Error> {
    let place = vm.pop()?;
    let src = vm.pop()?;
    let key = vm.frame(place).name();
    let found = vm.frame(src).get(&key)?;
    vm.push(found);
    Ok(())
}

// ( what addr place -- place ) keyed write, the place stays on the stack
fn stor(vm: &mut Vm) -> Result<(), Error> {
    let place = vm.pop()?;
    let addr = vm.pop()?;
    let what = vm.pop()?;
    let key = vm.frame(addr).name();
    vm.frame_mut(place).set(&key, what);
    vm.push(place);
    Ok(())
}

// wrappers: pop a frame, push a fresh one of the given type with its name

fn wrap(vm: &mut Vm, tag: Tag) -> Result<(), Error> {
    let source = vm.pop()?;
    let name = vm.frame(source).name();
    let id = vm.alloc(Frame::named(tag, &name));
    vm.push(id);
    Ok(())
}

fn module(vm: &mut Vm) -> Result<(), Error> {
    wrap(vm, Tag::Module)
}

fn dir(vm: &mut Vm) -> Result<(), Error> {
    wrap(vm, Tag::Dir)
}

fn file(vm: &mut Vm) -> Result<(), Error> {
    wrap(vm, Tag::File)
}

fn url(vm: &mut Vm) -> Result<(), Error> {
    wrap(vm, Tag::Url)
}

fn email(vm: &mut Vm) -> Result<(), Error> {
    wrap(vm, Tag::Email)
}

fn dot_title(vm: &mut Vm) -> Result<(), Error> {
    wrap(vm, Tag::Title)
}

fn dot_author(vm: &mut Vm) -> Result<(), Error> {
    wrap(vm, Tag::Author)
}

// token stream

// fetch the next token raw, bypassing resolution; a no-op at end of input
fn quote(vm: &mut Vm) -> Result<(), Error> {
    word(vm).map(|_| ())
}

// compiling words

// the innermost aggregate nests itself, a cycle by construction
fn rec(vm: &mut Vm) -> Result<(), Error> {
    let inner = vm.inner()?;
    vm.frame_mut(inner).push(inner);
    Ok(())
}

// open a plain aggregate
fn lq(vm: &mut Vm) -> Result<(), Error> {
    vm.open(Frame::vector(""));
    Ok(())
}

// close the innermost aggregate: nest it into the enclosing one, or leave
// it on the stack when it was the outermost
fn rq(vm: &mut Vm) -> Result<(), Error> {
    let item = vm.close()?;
    match vm.inner() {
        Ok(enclosing) => vm.frame_mut(enclosing).push(item),
        Err(_) => vm.push(item),
    }
    Ok(())
}

// open a code aggregate
fn lc(vm: &mut Vm) -> Result<(), Error> {
    vm.open(Frame::seq(""));
    Ok(())
}

fn rc(vm: &mut Vm) -> Result<(), Error> {
    rq(vm)
}
