use frame::{Frame, TokenSource};
use utils::Error;

// Scans source text into frames: each token arrives already carrying its
// runtime type. Rule order decides ties, so `0x1f` is hex before `0` is an
// integer before `x1f` is a symbol, and `3.2e5` is the number 3.2 followed
// by the symbol `e5`, exactly as the rules fall.
pub struct Lexer {
    // owned: the machine outlives any single interpreted input
    input: String,
    // current position in input, corresponds to
    // `ch`.
    position: usize,
    // current reading position, always points to
    // the next character in the input.
    read_position: usize,
    // current byte under examination (at `position`)
    ch: u8,
}

impl Lexer {
    pub fn new(input: String) -> Lexer {
        let mut lexer = Lexer {
            input,
            position: 0,
            read_position: 0,
            ch: 0,
        };
        // initialize lexer to a correct state
        lexer.read_char();
        lexer
    }

    // Produce the next frame, or None when the input is exhausted. String
    // and comment modes are entered and left inside a single call; only an
    // unterminated mode at end of input leaks out, and it ends the stream
    // silently.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, Error> {
        loop {
            self.skip_whitespace();

            match self.ch as char {
                '\0' => return Ok(None),
                '\'' => return self.read_str(),
                '(' => {
                    if !self.skip_comment()? {
                        return Ok(None);
                    }
                }
                '#' | '\\' => self.skip_line(),
                _ => return self.read_token().map(Some),
            }
        }
    }

    fn read_char(&mut self) {
        if self.read_position >= self.input.len() {
            self.ch = 0;
        } else {
            self.ch = self.input.as_bytes()[self.read_position];
        }
        self.position = self.read_position;
        self.read_position += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.ch == b' ' || self.ch == b'\t' || self.ch == b'\r' || self.ch == b'\n' {
            self.read_char();
        }
    }

    // line comments: `#` or `\` discard the rest of the line
    fn skip_line(&mut self) {
        while self.ch != b'\n' && self.ch != 0 {
            self.read_char();
        }
    }

    // string mode: everything between single quotes, verbatim. A newline
    // is an error; end of input drops the open string and ends the stream.
    fn read_str(&mut self) -> Result<Option<Frame>, Error> {
        let start = self.position + 1;
        loop {
            self.read_char();
            match self.ch as char {
                '\'' => break,
                '\n' => return Err(self.error_at(self.position)),
                '\0' => return Ok(None),
                _ => {}
            }
        }
        let text = &self.input[start..self.position];
        let frame = Frame::string(text);
        self.read_char();
        Ok(Some(frame))
    }

    // comment mode: from `(` to the first `)`, no nesting. Same newline
    // and end-of-input handling as strings. Returns false when the input
    // ran out inside the comment.
    fn skip_comment(&mut self) -> Result<bool, Error> {
        loop {
            self.read_char();
            match self.ch as char {
                ')' => break,
                '\n' => return Err(self.error_at(self.position)),
                '\0' => return Ok(false),
                _ => {}
            }
        }
        self.read_char();
        Ok(true)
    }

    // default mode, one rule wins per token: hex, bin, exponent number,
    // dotted number, integer, symbol. The symbol rule cannot fail on a
    // non-space byte, so the fallback never misses.
    fn read_token(&mut self) -> Result<Frame, Error> {
        let rest = &self.input.as_bytes()[self.position..];

        let n = match_hex(rest);
        if n > 0 {
            let text = self.take(n);
            let value = i64::from_str_radix(&text[2..], 16)
                .map_err(|_| self.error_on(&text))?;
            return Ok(Frame::hex(value));
        }

        let n = match_bin(rest);
        if n > 0 {
            let text = self.take(n);
            let value = i64::from_str_radix(&text[2..], 2)
                .map_err(|_| self.error_on(&text))?;
            return Ok(Frame::bin(value));
        }

        let n = match_exp(rest).max(match_dot(rest));
        if n > 0 {
            let text = self.take(n);
            let value = text.parse::<f64>().map_err(|_| self.error_on(&text))?;
            return Ok(Frame::number(value));
        }

        let n = match_int(rest);
        if n > 0 {
            let text = self.take(n);
            let value = text.parse::<i64>().map_err(|_| self.error_on(&text))?;
            return Ok(Frame::integer(value));
        }

        let n = match_symbol(rest);
        let text = self.take(n);
        Ok(Frame::symbol(&text))
    }

    // consume `n` bytes starting at the cursor and return them
    fn take(&mut self, n: usize) -> String {
        let text = self.input[self.position..self.position + n].to_string();
        for _ in 0..n {
            self.read_char();
        }
        text
    }

    fn error_at(&self, offset: usize) -> Error {
        let found = (self.ch as char).to_string();
        Error::LexicalError { offset, found }
    }

    fn error_on(&self, text: &str) -> Error {
        Error::LexicalError {
            offset: self.position - text.len(),
            found: text.to_string(),
        }
    }
}

impl TokenSource for Lexer {
    fn token(&mut self) -> Result<Option<Frame>, Error> {
        self.next_frame()
    }
}

fn is_digit(b: u8) -> bool {
    (b as char).is_digit(10)
}

fn digits(rest: &[u8], from: usize) -> usize {
    let mut i = from;
    while i < rest.len() && is_digit(rest[i]) {
        i += 1;
    }
    i - from
}

// 0x[0-9a-fA-F]+
fn match_hex(rest: &[u8]) -> usize {
    if rest.len() < 3 || rest[0] != b'0' || rest[1] != b'x' {
        return 0;
    }
    let mut i = 2;
    while i < rest.len() && (rest[i] as char).is_digit(16) {
        i += 1;
    }
    if i > 2 {
        i
    } else {
        0
    }
}

// 0b[01]+
fn match_bin(rest: &[u8]) -> usize {
    if rest.len() < 3 || rest[0] != b'0' || rest[1] != b'b' {
        return 0;
    }
    let mut i = 2;
    while i < rest.len() && (rest[i] == b'0' || rest[i] == b'1') {
        i += 1;
    }
    if i > 2 {
        i
    } else {
        0
    }
}

fn sign(rest: &[u8]) -> usize {
    if !rest.is_empty() && (rest[0] == b'+' || rest[0] == b'-') {
        1
    } else {
        0
    }
}

// [+-]?[0-9]+[eE][+-]?[0-9]+
fn match_exp(rest: &[u8]) -> usize {
    let mut i = sign(rest);
    let mantissa = digits(rest, i);
    if mantissa == 0 {
        return 0;
    }
    i += mantissa;
    if i >= rest.len() || (rest[i] != b'e' && rest[i] != b'E') {
        return 0;
    }
    i += 1;
    i += sign(&rest[i..]);
    let exponent = digits(rest, i);
    if exponent == 0 {
        return 0;
    }
    i + exponent
}

// [+-]?[0-9]*\.[0-9]+
fn match_dot(rest: &[u8]) -> usize {
    let mut i = sign(rest);
    i += digits(rest, i);
    if i >= rest.len() || rest[i] != b'.' {
        return 0;
    }
    i += 1;
    let fraction = digits(rest, i);
    if fraction == 0 {
        return 0;
    }
    i + fraction
}

// [+-]?[0-9]+
fn match_int(rest: &[u8]) -> usize {
    let i = sign(rest);
    let run = digits(rest, i);
    if run == 0 {
        return 0;
    }
    i + run
}

// a lone backtick, or a maximal run of anything but whitespace and the
// line comment leaders; quote and paren only open their modes at token
// start, inside a run they are ordinary symbol bytes
fn match_symbol(rest: &[u8]) -> usize {
    if rest[0] == b'`' {
        return 1;
    }
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            b' ' | b'\t' | b'\r' | b'\n' | b'#' | b'\\' => break,
            _ => i += 1,
        }
    }
    i
}
