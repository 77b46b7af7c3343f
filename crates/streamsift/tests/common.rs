#![allow(missing_docs)]
#![allow(dead_code)]

use crossbeam::channel::{self, Receiver};
use streamsift::{Fields, Value};

/// Output of a tendermint node with some plain text and a torn record mixed in.
pub const NODE_OUTPUT: &str = concat!(
    "starting node\n",
    r#"{"_msg":"Executed block","height":2,"invalidTxs":0,"level":"info","module":"state","validTxs":0}"#,
    "\n",
    r#"{"_msg":"Block{\n  Header{\n    ChainID:        localnet\n    Height:         2\n  }#F400\n}#F400","level":"info","module":"consensus"}"#,
    "\n",
    r#"I[2019-04-27|01:13:43.232] Committed state {"unterminated": "yes""#,
    "\n",
    r#"{"level":"error","msg":"oops"}"#,
    "\n   \n",
    "panic: runtime error\n",
);

pub const REDIS_OUTPUT: &str = "\
66940:C 18 Apr 2019 15:18:28.565 # Configuration loaded
66940:M 18 Apr 2019 15:18:28.566 * Running mode=standalone, port=6379.
66940:M 18 Apr 2019 15:18:28.566 - Accepted 127.0.0.1:52422

not a redis line
";

/// An output callback that forwards records to a channel.
pub fn collector() -> (impl FnMut(Fields) + Send + 'static, Receiver<Fields>) {
    let (tx, rx) = channel::unbounded();
    (
        move |fields| {
            let _ = tx.send(fields);
        },
        rx,
    )
}

/// One record per line, as JSON.
pub fn render(records: impl IntoIterator<Item = Fields>) -> String {
    records
        .into_iter()
        .map(|fields| Value::Object(fields).to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
