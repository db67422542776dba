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
#![allow(dead_code)]

use image::{ImageFormat, Rgba, RgbaImage};
use lumen_core::device::HeadlessContext;
use lumen_core::SignalSlot;
use lumen_data::{AssetLibrary, AssetLibraryRef};
use lumen_io::protocol::MemoryProtocol;
use lumen_io::{AbstractParser, Options, ParserError};
use lumen_lanes::{EffectParser, GeometryParser, ImageParser, MaterialParser, SceneParser};
use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

pub type Events = Rc<RefCell<Vec<String>>>;

pub fn events() -> Events {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn library() -> AssetLibraryRef {
    AssetLibrary::new(Rc::new(HeadlessContext::new()))
}

/// Options reading from `protocol` with every lane parser registered.
pub fn options_with(library: &AssetLibraryRef, protocol: &Rc<MemoryProtocol>) -> Options {
    let mut options = Options::new(library);
    options.set_protocol(protocol.clone());
    register_parsers(&mut options);
    options
}

pub fn register_parsers(options: &mut Options) {
    options
        .register_parser("effect", EffectParser::factory())
        .register_parser("scene", SceneParser::factory())
        .register_parser("geometry", GeometryParser::factory())
        .register_parser("material", MaterialParser::factory());
    for extension in ImageParser::EXTENSIONS {
        options.register_parser(extension, ImageParser::factory());
    }
}

/// Records `complete`, `error:<tag>` and `progress:<value>` events of a parser.
pub fn record(parser: &dyn AbstractParser, events: &Events) -> Vec<SignalSlot> {
    let signals = parser.signals();
    let sink = events.clone();
    let on_complete = signals
        .complete
        .connect(move |_| sink.borrow_mut().push("complete".to_string()));
    let sink = events.clone();
    let on_error = signals.error.connect(move |error: &ParserError| {
        sink.borrow_mut().push(format!("error:{}", error.type_tag()))
    });
    let sink = events.clone();
    let on_progress = signals
        .progress
        .connect(move |value: &f32| sink.borrow_mut().push(format!("progress:{value}")));
    vec![on_complete, on_error, on_progress]
}

/// A PNG of `width` x `height` opaque red texels.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("PNG encoding of an in-memory image");
    bytes
}
