// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
mod common;

use common::{events, library, options_with, push, Events, Mode, TextParser};
use lumen_core::SignalSlot;
use lumen_io::protocol::MemoryProtocol;
use lumen_io::{AbstractLoader, LoadError, Loader, LoaderRef, ParserErrorPolicy};
use std::rc::Rc;

fn record(loader: &LoaderRef, events: &Events) -> Vec<SignalSlot> {
    let sink = events.clone();
    let on_complete = loader
        .signals()
        .complete
        .connect(move |_| push(&sink, "complete"));
    let sink = events.clone();
    let on_error = loader.signals().error.connect(move |error: &LoadError| {
        push(
            &sink,
            format!("error:{}:{}", error.type_tag(), error.is_fatal()),
        )
    });
    vec![on_complete, on_error]
}

#[test]
fn files_without_a_parser_are_stored_as_blobs() {
    let library = library();
    let protocol = Rc::new(MemoryProtocol::new());
    protocol.insert("notes/readme.txt", b"hello".to_vec());
    let options = options_with(&library, &protocol);

    let loader = Loader::create();
    let log = events();
    let _slots = record(&loader, &log);
    loader.load("notes/readme.txt", options);

    assert_eq!(*log.borrow(), vec!["complete"]);
    assert_eq!(
        library.blob("notes/readme.txt").as_deref(),
        Some(&b"hello"[..])
    );
    assert_eq!(&*loader.data(), b"hello");
}

#[test]
fn parsers_are_selected_by_lowercase_extension() {
    let library = library();
    let protocol = Rc::new(MemoryProtocol::new());
    protocol.insert("notes/README.TXT", b"hello".to_vec());
    let mut options = options_with(&library, &protocol);
    options.register_parser("txt", TextParser::factory(Mode::Upper));

    let loader = Loader::create();
    let log = events();
    let _slots = record(&loader, &log);
    loader.load("notes/README.TXT", options);

    assert_eq!(*log.borrow(), vec!["complete"]);
    assert_eq!(
        library.blob("notes/README.TXT.parsed").as_deref(),
        Some(&b"HELLO"[..])
    );
    assert!(!library.has_blob("notes/README.TXT"));
}

#[test]
fn include_paths_and_uri_rewriting_only_change_the_resolved_name() {
    let library = library();
    let protocol = Rc::new(MemoryProtocol::new());
    protocol.insert("assets/v2/mesh.bin", b"mesh".to_vec());
    let mut options = options_with(&library, &protocol);
    options
        .add_include_path("assets")
        .set_uri_function(Rc::new(|name: &str| format!("v2/{name}")));

    let loader = Loader::create();
    loader.load("mesh.bin", options);

    assert_eq!(loader.filename(), "mesh.bin");
    assert_eq!(loader.resolved_filename(), "assets/v2/mesh.bin");
    assert!(library.has_blob("mesh.bin"));
}

#[test]
fn parse_errors_follow_the_policy() {
    for (policy, expected) in [
        (ParserErrorPolicy::Propagate, "error:InvalidFile:true"),
        (ParserErrorPolicy::Swallow, "complete"),
    ] {
        let library = library();
        let protocol = Rc::new(MemoryProtocol::new());
        protocol.insert("bad.txt", b"?".to_vec());
        let mut options = options_with(&library, &protocol);
        options
            .register_parser("txt", TextParser::factory(Mode::Reject))
            .set_parser_error_policy(policy);

        let loader = Loader::create();
        let log = events();
        let _slots = record(&loader, &log);
        loader.load("bad.txt", options);

        assert_eq!(*log.borrow(), vec![expected], "policy {policy:?}");
        assert!(!library.has_blob("bad.txt.parsed"));
    }
}

#[test]
fn non_fatal_parser_errors_are_forwarded_before_completion() {
    let library = library();
    let protocol = Rc::new(MemoryProtocol::new());
    protocol.insert("partial.txt", b"x".to_vec());
    let mut options = options_with(&library, &protocol);
    options.register_parser("txt", TextParser::factory(Mode::Partial));

    let loader = Loader::create();
    let log = events();
    let _slots = record(&loader, &log);
    loader.load("partial.txt", options);

    assert_eq!(
        *log.borrow(),
        vec!["error:MissingTextureDependency:false", "complete"]
    );
}

#[test]
fn fetch_failures_are_fatal() {
    let library = library();
    let protocol = Rc::new(MemoryProtocol::new());
    let options = options_with(&library, &protocol);

    let loader = Loader::create();
    let log = events();
    let _slots = record(&loader, &log);
    loader.load("missing.bin", options);

    assert_eq!(*log.borrow(), vec!["error:FetchError:true"]);
}

#[test]
fn dropping_the_loader_cancels_the_load() {
    let library = library();
    let protocol = Rc::new(MemoryProtocol::deferred());
    protocol.insert("late.bin", b"late".to_vec());
    let options = options_with(&library, &protocol);

    let loader = Loader::create();
    let log = events();
    let _slots = record(&loader, &log);
    loader.load("late.bin", options);
    drop(loader);

    assert_eq!(protocol.deliver_all(), 1);
    assert!(log.borrow().is_empty());
    assert!(!library.has_blob("late.bin"));
}

#[test]
fn loads_finishing_after_the_library_is_dropped_are_ignored() {
    let library = library();
    let protocol = Rc::new(MemoryProtocol::deferred());
    protocol.insert("late.bin", b"late".to_vec());
    let options = options_with(&library, &protocol);

    let loader = Loader::create();
    let log = events();
    let _slots = record(&loader, &log);
    loader.load("late.bin", options);
    drop(library);

    protocol.deliver_all();
    assert!(log.borrow().is_empty());
}
