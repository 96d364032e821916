use frame::{Frame, Tag, Value, Vm};
use lexer::Lexer;
use utils::Error;

pub mod words;

// a machine with the boot vocabulary installed
pub fn boot(name: &str) -> Vm {
    let mut vm = Vm::new(name);
    words::install(&mut vm);
    vm
}

// push the text as a string frame and interpret it
pub fn run(vm: &mut Vm, text: &str) -> Result<(), Error> {
    let id = vm.alloc(Frame::string(text));
    vm.push(id);
    interpret(vm)
}

// Fetch one token from the active stream onto the stack. False means the
// input is exhausted.
pub fn word(vm: &mut Vm) -> Result<bool, Error> {
    match vm.next_token()? {
        Some(frame) => {
            let id = vm.alloc(frame);
            vm.push(id);
            Ok(true)
        }
        None => Ok(false),
    }
}

// Replace the symbol on top of the stack with its dictionary binding. The
// lookup tries the exact spelling first, then the uppercased one, so `dup`
// reaches DUP unless something was bound under `dup` itself.
pub fn find(vm: &mut Vm) -> Result<(), Error> {
    let token = vm.pop()?;
    let name = vm.frame(token).name();
    let id = match vm.get(&name) {
        Ok(id) => id,
        Err(_) => vm
            .get(&name.to_uppercase())
            .map_err(|_| Error::UnresolvedSymbol(name))?,
    };
    vm.push(id);
    Ok(())
}

// Pop and evaluate: a command runs its host effect, anything else
// evaluates to itself and lands back on the stack.
pub fn eval(vm: &mut Vm) -> Result<(), Error> {
    let id = vm.pop()?;
    if let Value::Word(word) = vm.frame(id).value() {
        let run = word.1;
        return run(vm);
    }
    vm.push(id);
    Ok(())
}

// move the top of the stack into the innermost open aggregate
pub fn compile(vm: &mut Vm) -> Result<(), Error> {
    let id = vm.pop()?;
    let inner = vm.inner()?;
    vm.frame_mut(inner).push(id);
    Ok(())
}

// Pop a frame and interpret its text. The compile stack is deliberately
// left alone between inputs, so an aggregate can stay open across lines.
pub fn interpret(vm: &mut Vm) -> Result<(), Error> {
    let source = vm.pop()?;
    let text = vm.frame(source).name();
    vm.set_source(Some(Box::new(Lexer::new(text))));
    let outcome = interpret_stream(vm);
    vm.set_source(None);
    outcome
}

// The two-phase loop: resolve symbols, then either evaluate or compile.
// With no aggregate open everything evaluates; inside one, only immediate
// commands do.
fn interpret_stream(vm: &mut Vm) -> Result<(), Error> {
    while word(vm)? {
        if vm.frame(vm.top()?).tag() == Tag::Symbol {
            find(vm)?;
        }
        let top = vm.top()?;
        if !vm.compiling() || vm.frame(top).immediate {
            eval(vm)?;
        } else {
            compile(vm)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boot_vm() -> Vm {
        boot("test")
    }

    fn run_ok(vm: &mut Vm, input: &str) {
        if let Err(e) = run(vm, input) {
            panic!("{}: {}", input, e);
        }
    }

    fn stack_literals(vm: &Vm) -> Vec<String> {
        vm.stack()
            .iter()
            .map(|&id| vm.frame(id).literal())
            .collect()
    }

    #[test]
    fn literals_stay_on_the_stack() {
        let mut vm = boot_vm();
        run_ok(&mut vm, "1 2.5 'x y' 0x1f 0b101");
        assert_eq!(stack_literals(&vm), &["1", "2.5", "x y", "0x1f", "0b101"]);
        let tags: Vec<Tag> = vm.stack().iter().map(|&id| vm.frame(id).tag()).collect();
        assert_eq!(tags, &[Tag::Int, Tag::Num, Tag::Str, Tag::Hex, Tag::Bin]);
    }

    #[test]
    fn stack_words_rearrange() {
        struct T(&'static str, &'static [&'static str]);
        let t = T;

        let tests = [
            t("1 2 SWAP", &["2", "1"]),
            t("1 2 swap", &["2", "1"]),
            t("5 3 SWAP", &["3", "5"]),
            t("1 2 OVER", &["1", "2", "1"]),
            t("1 2 DROP", &["1"]),
            t("1 2 3 .", &[]),
        ];

        for test in tests.iter() {
            let mut vm = boot_vm();
            run_ok(&mut vm, test.0);
            assert_eq!(stack_literals(&vm), test.1, "input {:?}", test.0);
        }
    }

    #[test]
    fn dup_shares_the_frame_instead_of_copying() {
        let mut vm = boot_vm();
        run_ok(&mut vm, "5 DUP");
        assert_eq!(vm.depth(), 2);
        assert_eq!(vm.stack()[0], vm.stack()[1]);
    }

    #[test]
    fn stack_words_underflow_cleanly() {
        struct T(&'static str);
        let t = T;

        let tests = [t("DUP"), t("DROP"), t("SWAP"), t("OVER"), t("5 SWAP")];

        for test in tests.iter() {
            let mut vm = boot_vm();
            assert_eq!(run(&mut vm, test.0), Err(Error::EmptyStack));
        }
    }

    #[test]
    fn unresolved_symbols_report_their_spelling() {
        let mut vm = boot_vm();
        assert_eq!(
            run(&mut vm, "nosuchword"),
            Err(Error::UnresolvedSymbol("nosuchword".to_string()))
        );
        // the miss leaves no trace in the dictionary
        assert!(vm.get("nosuchword").is_err());
        assert!(vm.get("NOSUCHWORD").is_err());
    }

    #[test]
    fn comments_vanish_between_live_tokens() {
        let mut vm = boot_vm();
        run_ok(&mut vm, "1 ( this 2 is skipped ) 3");
        assert_eq!(stack_literals(&vm), &["1", "3"]);
    }

    #[test]
    fn exact_spelling_wins_over_the_uppercase_fallback() {
        let mut vm = boot_vm();
        // bind an ordinary frame under lowercase `dup`
        run_ok(&mut vm, "1 ` dup =");
        // now `dup` evaluates to that frame instead of reaching DUP
        run_ok(&mut vm, "5 dup");
        assert_eq!(stack_literals(&vm), &["5", "1"]);
    }

    #[test]
    fn eq_binds_under_the_popped_name() {
        let mut vm = boot_vm();
        run_ok(&mut vm, "1984 ` year =");
        assert_eq!(vm.depth(), 0);
        let bound = vm.get("year").unwrap();
        assert_eq!(vm.frame(bound).tag(), Tag::Int);
        assert_eq!(vm.frame(bound).literal(), "1984");
    }

    #[test]
    fn lshift_binds_into_a_frame_by_name() {
        let mut vm = boot_vm();
        run_ok(&mut vm, "'box' MODULE 'lid' FILE <<");
        assert_eq!(vm.depth(), 1);
        let dst = vm.top().unwrap();
        assert_eq!(vm.frame(dst).tag(), Tag::Module);
        let lid = vm.frame(dst).get("lid").unwrap();
        assert_eq!(vm.frame(lid).tag(), Tag::File);
    }

    #[test]
    fn push_nests_into_the_frame_on_top() {
        let mut vm = boot_vm();
        run_ok(&mut vm, "42 'box' MODULE //");
        assert_eq!(vm.depth(), 1);
        let dst = vm.top().unwrap();
        assert_eq!(vm.frame(dst).nest().len(), 1);
        let inside = vm.frame(dst).nest()[0];
        assert_eq!(vm.frame(inside).literal(), "42");
    }

    #[test]
    fn attr_writes_a_slot_and_rfetch_reads_it_back() {
        let mut vm = boot_vm();
        run_ok(&mut vm, "'box' MODULE 42 ` answer /<");
        assert_eq!(vm.depth(), 1);
        let dst = vm.top().unwrap();
        let answer = vm.frame(dst).get("answer").unwrap();
        assert_eq!(vm.frame(answer).literal(), "42");

        // /@ pops the frame and pushes the slot value
        run_ok(&mut vm, "` answer /@");
        assert_eq!(stack_literals(&vm), &["42"]);

        let mut vm = boot_vm();
        run_ok(&mut vm, "'box' MODULE");
        assert_eq!(
            run(&mut vm, "` missing /@"),
            Err(Error::KeyNotFound("missing".to_string()))
        );
    }

    #[test]
    fn stor_writes_and_leaves_the_place() {
        let mut vm = boot_vm();
        run_ok(&mut vm, "42 ` answer 'box' MODULE /=");
        assert_eq!(vm.depth(), 1);
        let place = vm.top().unwrap();
        assert_eq!(vm.frame(place).tag(), Tag::Module);
        let answer = vm.frame(place).get("answer").unwrap();
        assert_eq!(vm.frame(answer).literal(), "42");
    }

    #[test]
    fn brackets_collect_into_a_vector() {
        let mut vm = boot_vm();
        run_ok(&mut vm, "[ 1 2 3 ]");
        assert_eq!(vm.depth(), 1);
        let vec = vm.top().unwrap();
        assert_eq!(vm.frame(vec).tag(), Tag::Vector);
        let inside: Vec<String> = vm
            .frame(vec)
            .nest()
            .iter()
            .map(|&id| vm.frame(id).literal())
            .collect();
        assert_eq!(inside, &["1", "2", "3"]);
    }

    #[test]
    fn closed_aggregates_nest_into_the_enclosing_one() {
        let mut vm = boot_vm();
        run_ok(&mut vm, "[ 1 [ 2 ] 3 ]");
        assert_eq!(vm.depth(), 1);
        let outer = vm.top().unwrap();
        assert_eq!(vm.frame(outer).nest().len(), 3);
        let middle = vm.frame(outer).nest()[1];
        assert_eq!(vm.frame(middle).tag(), Tag::Vector);
        assert_eq!(vm.frame(middle).nest().len(), 1);
    }

    #[test]
    fn braces_collect_into_a_seq_that_never_self_runs() {
        let mut vm = boot_vm();
        run_ok(&mut vm, "{ 1 2 } ` code =");
        assert_eq!(vm.depth(), 0);

        // invoking the binding evaluates the seq to itself
        run_ok(&mut vm, "code");
        assert_eq!(vm.depth(), 1);
        let code = vm.top().unwrap();
        assert_eq!(code, vm.get("code").unwrap());
        assert_eq!(vm.frame(code).tag(), Tag::Seq);
        assert_eq!(vm.frame(code).nest().len(), 2);
    }

    #[test]
    fn closers_match_any_opener() {
        let mut vm = boot_vm();
        run_ok(&mut vm, "{ 1 ]");
        let top = vm.top().unwrap();
        assert_eq!(vm.frame(top).tag(), Tag::Seq);
        assert_eq!(vm.frame(top).nest().len(), 1);

        let mut vm = boot_vm();
        run_ok(&mut vm, "[ 1 }");
        let top = vm.top().unwrap();
        assert_eq!(vm.frame(top).tag(), Tag::Vector);
    }

    #[test]
    fn compile_survives_between_inputs() {
        let mut vm = boot_vm();
        run_ok(&mut vm, "[ 1");
        assert_eq!(vm.depth(), 0);
        assert!(vm.compiling());
        run_ok(&mut vm, "2 ]");
        assert!(!vm.compiling());
        let vec = vm.top().unwrap();
        assert_eq!(vm.frame(vec).nest().len(), 2);
    }

    #[test]
    fn stray_closers_and_rec_are_malformed() {
        let mut vm = boot_vm();
        assert_eq!(run(&mut vm, "]"), Err(Error::MalformedAggregate));

        let mut vm = boot_vm();
        assert_eq!(run(&mut vm, "}"), Err(Error::MalformedAggregate));

        let mut vm = boot_vm();
        assert_eq!(
            run(&mut vm, "REC"),
            Err(Error::MalformedAggregate)
        );
    }

    #[test]
    fn rec_nests_the_aggregate_into_itself() {
        let mut vm = boot_vm();
        run_ok(&mut vm, "[ 1 REC ]");
        let vec = vm.top().unwrap();
        assert_eq!(vm.frame(vec).nest().len(), 2);
        assert_eq!(vm.frame(vec).nest()[1], vec);
        // the cycle must not hang the dump
        assert!(vm.dump_frame(vec, false).ends_with("_/"));
    }

    #[test]
    fn immediate_words_run_while_compiling() {
        let mut vm = boot_vm();
        // ? is immediate, so it prints instead of being collected
        run_ok(&mut vm, "[ ? ]");
        let vec = vm.top().unwrap();
        assert!(vm.frame(vec).nest().is_empty());
    }

    #[test]
    fn quote_takes_the_next_token_raw() {
        let mut vm = boot_vm();
        run_ok(&mut vm, "` DUP");
        assert_eq!(vm.depth(), 1);
        let raw = vm.top().unwrap();
        assert_eq!(vm.frame(raw).tag(), Tag::Symbol);
        assert_eq!(vm.frame(raw).literal(), "DUP");

        // quoting at end of input is a no-op
        let mut vm = boot_vm();
        run_ok(&mut vm, "`");
        assert_eq!(vm.depth(), 0);
    }

    #[test]
    fn strings_do_not_resolve() {
        let mut vm = boot_vm();
        run_ok(&mut vm, "'DUP'");
        assert_eq!(vm.depth(), 1);
        assert_eq!(vm.frame(vm.top().unwrap()).tag(), Tag::Str);
    }

    #[test]
    fn wrapper_words_retype_the_name() {
        struct T(&'static str, Tag);
        let t = T;

        let tests = [
            t("'src' MODULE", Tag::Module),
            t("'/tmp' DIR", Tag::Dir),
            t("'notes.txt' FILE", Tag::File),
            t("'http://localhost/' URL", Tag::Url),
            t("'dev@localhost' EMAIL", Tag::Email),
            t("'a title' .title", Tag::Title),
            t("'a name' .author", Tag::Author),
        ];

        for test in tests.iter() {
            let mut vm = boot_vm();
            run_ok(&mut vm, test.0);
            assert_eq!(vm.depth(), 1, "input {:?}", test.0);
            let top = vm.top().unwrap();
            assert_eq!(vm.frame(top).tag(), test.1, "input {:?}", test.0);
        }
    }

    #[test]
    fn boot_installs_the_language_markers() {
        let vm = boot_vm();
        assert_eq!(vm.get("VM").unwrap(), vm.root());
        let forth = vm.get("FORTH").unwrap();
        assert_eq!(vm.frame(forth).tag(), Tag::Lang);
        assert_eq!(vm.frame(forth).literal(), "FORTH");
        let own = vm.get("minsky").unwrap();
        assert_eq!(vm.frame(own).literal(), "minsky");
    }

    #[test]
    fn lexical_errors_surface_through_interpret() {
        let mut vm = boot_vm();
        assert!(matches!(
            run(&mut vm, "'bad\nstring'"),
            Err(Error::LexicalError { .. })
        ));
    }

    #[test]
    fn interpret_consumes_its_source_frame() {
        let mut vm = boot_vm();
        run_ok(&mut vm, "");
        assert_eq!(vm.depth(), 0);
    }
}
