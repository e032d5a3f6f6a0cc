use serde::{Deserialize, Serialize};
use serde_fstorage::{
    from_str, node, to_node, to_string, CodecRegistry, Depth, Document, ErrorKind, FileNode,
    FileStorage, Matrix, Mode, Node, NodeMap, Record, Result,
};
use std::path::Path;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq)]
struct MyData {
    a: i32,
    x: f64,
    id: String,
}

impl Default for MyData {
    fn default() -> Self {
        MyData {
            a: 1,
            x: 0.0,
            id: String::new(),
        }
    }
}

impl Record for MyData {
    fn encode(&self) -> Result<NodeMap> {
        let mut map = NodeMap::new();
        map.push("A", self.a)?;
        map.push("X", self.x)?;
        map.push("id", self.id.as_str())?;
        Ok(map)
    }

    fn decode(node: FileNode<'_>) -> Result<Self> {
        Ok(MyData {
            a: node.get("A")?.as_i32()?,
            x: node.get("X")?.as_f64()?,
            id: node.get("id")?.as_str()?.to_string(),
        })
    }
}

fn write_sample(path: &Path) {
    let mut fs = FileStorage::open(path, Mode::Write).unwrap();
    fs.write("num1", 1).unwrap();
    fs.write("num2", 2).unwrap();
    fs.write("A", Matrix::filled(4, 5, Depth::F32, 10.0)).unwrap();

    fs.begin_seq("seq_node").unwrap();
    for i in 0..10 {
        fs.push(i).unwrap();
    }
    fs.end().unwrap();

    fs.begin_map("map_node").unwrap();
    for i in 0..10 {
        fs.write(&format!("node_{}", i), i).unwrap();
    }
    fs.end().unwrap();

    let data = MyData {
        a: 97,
        x: 3.1415926,
        id: "mydata1234".to_string(),
    };
    fs.write_record("MyData", &data).unwrap();
    fs.close().unwrap();
}

#[test]
fn test_write_then_read_sample_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.yml");
    write_sample(&path);

    let text = std::fs::read_to_string(&path).unwrap();
    println!("Stored file:\n{}", text);
    assert!(text.starts_with("%YAML:1.0\n---\nnum1: 1\nnum2: 2\nA: !!opencv-matrix\n"));

    let fs = FileStorage::open(&path, Mode::Read).unwrap();
    assert_eq!(fs.get("num1").unwrap().as_i64().unwrap(), 1);
    assert_eq!(fs.get("num2").unwrap().as_i64().unwrap(), 2);

    let keys: Vec<&str> = fs.root().unwrap().keys().collect();
    assert_eq!(keys, vec!["num1", "num2", "A", "seq_node", "map_node", "MyData"]);
}

#[test]
fn test_matrix_of_twenty_tens() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.yml");
    write_sample(&path);

    let text = std::fs::read_to_string(&path).unwrap();
    let data_line_count = text.matches("10.").count();
    assert_eq!(data_line_count, 20);

    let fs = FileStorage::open(&path, Mode::Read).unwrap();
    let a = fs.get("A").unwrap().to_matrix().unwrap();
    assert_eq!(a.rows(), 4);
    assert_eq!(a.cols(), 5);
    assert_eq!(a.depth(), Depth::F32);
    assert_eq!(a.data().len(), 20);
    assert!(a.data().iter().all(|&v| v == 10.0));
}

#[test]
fn test_matrix_node_exposes_stored_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.yml");
    write_sample(&path);

    let fs = FileStorage::open(&path, Mode::Read).unwrap();
    let a = fs.get("A").unwrap();
    assert_eq!(a.get("rows").unwrap().as_i64().unwrap(), 4);
    assert_eq!(a.get("dt").unwrap().as_str().unwrap(), "f");
    assert_eq!(a.get("data").unwrap().len(), 20);
    assert_eq!(a.entries().count(), 4);
}

#[test]
fn test_sequence_iteration_and_mapping_lookup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.yml");
    write_sample(&path);

    let fs = FileStorage::open(&path, Mode::Read).unwrap();
    let seq = fs.get("seq_node").unwrap();
    let values: Vec<i64> = seq.iter().map(|n| n.as_i64().unwrap()).collect();
    assert_eq!(values, (0..10).collect::<Vec<i64>>());
    assert_eq!(seq.at(4).unwrap().as_i64().unwrap(), 4);
    assert_eq!(seq.at(10).unwrap_err().kind(), ErrorKind::Index);

    let map = fs.get("map_node").unwrap();
    assert_eq!(map.get("node_3").unwrap().as_i64().unwrap(), 3);
    assert_eq!(map.get("node_10").unwrap_err().kind(), ErrorKind::Key);
}

#[test]
fn test_record_and_default_substitution() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.yml");
    write_sample(&path);

    let fs = FileStorage::open(&path, Mode::Read).unwrap();
    let data = fs
        .root()
        .unwrap()
        .child("MyData")
        .read_record_or(MyData::default())
        .unwrap();
    assert_eq!(
        data,
        MyData {
            a: 97,
            x: 3.1415926,
            id: "mydata1234".to_string(),
        }
    );

    let missing = fs
        .root()
        .unwrap()
        .child("NonExisting")
        .read_record_or(MyData::default())
        .unwrap();
    assert_eq!(missing, MyData::default());
}

#[test]
fn test_registry_by_tag() {
    let mut registry = CodecRegistry::new();
    registry.register_record::<MyData>("MyData").unwrap();

    let mut doc = Document::new();
    let value = MyData {
        a: 5,
        x: -0.25,
        id: "tagged".to_string(),
    };
    doc.push("item", registry.encode("MyData", &value).unwrap())
        .unwrap();
    let doc = from_str(&to_string(&doc).unwrap()).unwrap();

    let back = registry
        .decode("MyData", doc.view().child("item"), MyData::default())
        .unwrap();
    assert_eq!(back, value);
    let fallback = registry
        .decode("MyData", doc.view().child("other"), MyData::default())
        .unwrap();
    assert_eq!(fallback, MyData::default());
}

#[test]
fn test_invalid_key_persists_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keys.yml");
    let mut fs = FileStorage::open(&path, Mode::Write).unwrap();
    fs.write("good key", 1).unwrap();
    for bad in ["a.b", "x:y", "", "tab\there", "ümlaut", "slash/"] {
        let err = fs.write(bad, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Key, "key {:?}", bad);
    }
    let err = fs.write("nested", node!({ "bad!": 1 })).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Key);
    assert_eq!(fs.begin_map("bad#").unwrap_err().kind(), ErrorKind::Key);
    fs.close().unwrap();

    let fs = FileStorage::open(&path, Mode::Read).unwrap();
    assert_eq!(fs.document().len(), 1);
    assert!(fs.get("nested").is_err());
}

#[test]
fn test_duplicate_key_rejected() {
    let dir = TempDir::new().unwrap();
    let mut fs = FileStorage::open(dir.path().join("dup.yml"), Mode::Write).unwrap();
    fs.write("x", 1).unwrap();
    assert_eq!(fs.write("x", 2).unwrap_err().kind(), ErrorKind::Key);
    fs.begin_map("m").unwrap();
    fs.write("y", 1).unwrap();
    assert_eq!(fs.write("y", 1).unwrap_err().kind(), ErrorKind::Key);
    fs.end().unwrap();
    fs.close().unwrap();
}

#[test]
fn test_unbalanced_structure_produces_no_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("unbalanced.yml");
    let mut fs = FileStorage::open(&path, Mode::Write).unwrap();
    fs.write("num", 1).unwrap();
    fs.begin_seq("open").unwrap();
    fs.push(1).unwrap();

    let err = fs.close().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structure);
    assert!(!fs.is_open());
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_failed_close_keeps_previous_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keep.yml");
    write_sample(&path);
    let before = std::fs::read_to_string(&path).unwrap();

    let mut fs = FileStorage::open(&path, Mode::Write).unwrap();
    fs.begin_map("dangling").unwrap();
    assert!(fs.close().is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_close_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("twice.yml");
    let mut fs = FileStorage::open(&path, Mode::Write).unwrap();
    fs.write("x", 1).unwrap();
    fs.close().unwrap();
    fs.close().unwrap();
    assert!(!fs.is_open());
    assert_eq!(fs.write("y", 1).unwrap_err().kind(), ErrorKind::Structure);

    let mut fs = FileStorage::open(&path, Mode::Read).unwrap();
    fs.close().unwrap();
    fs.close().unwrap();
    assert_eq!(fs.get("x").unwrap_err().kind(), ErrorKind::Structure);
}

#[test]
fn test_append_adds_after_existing_entries() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("append.yml");

    let mut fs = FileStorage::open(&path, Mode::Append).unwrap();
    fs.write("first", 1).unwrap();
    fs.close().unwrap();

    let mut fs = FileStorage::open(&path, Mode::Append).unwrap();
    assert_eq!(fs.get("first").unwrap().as_i64().unwrap(), 1);
    fs.write("second", "two").unwrap();
    assert_eq!(fs.write("first", 3).unwrap_err().kind(), ErrorKind::Key);
    fs.close().unwrap();

    let fs = FileStorage::open(&path, Mode::Read).unwrap();
    let keys: Vec<&str> = fs.root().unwrap().keys().collect();
    assert_eq!(keys, vec!["first", "second"]);
    assert_eq!(fs.get("first").unwrap().as_i64().unwrap(), 1);
}

#[test]
fn test_open_errors() {
    let dir = TempDir::new().unwrap();
    let missing_dir = dir.path().join("no").join("such").join("file.yml");
    assert_eq!(
        FileStorage::open(&missing_dir, Mode::Write).unwrap_err().kind(),
        ErrorKind::Io
    );
    assert_eq!(
        FileStorage::open(dir.path(), Mode::Write).unwrap_err().kind(),
        ErrorKind::Io
    );

    let bad = dir.path().join("bad.yml");
    std::fs::write(&bad, "%YAML:1.0\n---\nkey: [ 1, 2\n").unwrap();
    assert_eq!(
        FileStorage::open(&bad, Mode::Read).unwrap_err().kind(),
        ErrorKind::Format
    );
    assert_eq!(
        FileStorage::open(&bad, Mode::Append).unwrap_err().kind(),
        ErrorKind::Format
    );
}

#[test]
fn test_reads_hand_written_file() {
    let text = "%YAML:1.0
---
# camera setup
name: 'left camera'
size: { width: 640, height: 480 }
points:
- x: 1
  y: 2
- x: 3
  y: 4
distortion: !!opencv-matrix
   rows: 1
   cols: 5
   dt: d
   data: [ -0.25, 0.1, 0., 0.,
       1.5e-3 ]
";
    let doc = from_str(text).unwrap();
    let root = doc.view();
    assert_eq!(root.get("name").unwrap().as_str().unwrap(), "left camera");
    assert_eq!(root.get("size").unwrap().get("height").unwrap().as_i64().unwrap(), 480);
    let points = root.get("points").unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points.at(1).unwrap().get("x").unwrap().as_i64().unwrap(), 3);
    let d = root.get("distortion").unwrap().to_matrix().unwrap();
    assert_eq!(d.depth(), Depth::F64);
    assert_eq!(d.data(), &[-0.25, 0.1, 0.0, 0.0, 1.5e-3]);
}

#[test]
fn test_format_errors_carry_position() {
    let err = from_str("%YAML:1.0\n---\na: 1\n  b: 2\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(err.to_string().contains("line 4"), "{}", err);

    let err = from_str("%YAML:1.0\n---\nm: !!opencv-matrix\n   rows: 2\n   cols: 2\n   dt: f\n   data: [ 1., 2., 3. ]\n")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Intrinsics {
    fx: f64,
    fy: f64,
    skew: Option<f64>,
    tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Model {
    Pinhole,
    Fisheye { k1: f64 },
}

#[test]
fn test_serde_values_through_storage() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("serde.yml");
    let intrinsics = Intrinsics {
        fx: 525.0,
        fy: 525.5,
        skew: None,
        tags: vec!["calibrated".to_string(), "2024".to_string()],
    };
    let models = vec![Model::Pinhole, Model::Fisheye { k1: 0.5 }];

    let mut fs = FileStorage::open(&path, Mode::Write).unwrap();
    fs.write("intrinsics", to_node(&intrinsics).unwrap()).unwrap();
    fs.write("models", to_node(&models).unwrap()).unwrap();
    fs.close().unwrap();

    let fs = FileStorage::open(&path, Mode::Read).unwrap();
    let back: Intrinsics = fs.get("intrinsics").unwrap().deserialize().unwrap();
    assert_eq!(back, intrinsics);
    let back: Vec<Model> = fs.get("models").unwrap().deserialize().unwrap();
    assert_eq!(back, models);
}

#[test]
fn test_document_round_trip_preserves_order_and_values() {
    let mut doc = Document::new();
    doc.push("zeta", 1).unwrap();
    doc.push("alpha", -2.5).unwrap();
    doc.push("empty", Node::None).unwrap();
    doc.push("text", "a: b # not a comment").unwrap();
    doc.push("specials", node!([(f64::INFINITY), (f64::NEG_INFINITY)])).unwrap();
    doc.push(
        "rgb",
        Matrix::with_channels(1, 2, 3, Depth::U8, vec![255.0, 0.0, 10.0, 1.0, 2.0, 3.0]).unwrap(),
    )
    .unwrap();
    doc.push("nested", node!({ "inner": { "list": [{ "k": 1 }, []] } }))
        .unwrap();

    let text = to_string(&doc).unwrap();
    let back = from_str(&text).unwrap();
    assert_eq!(back, doc);
    let keys: Vec<&String> = back.root().keys().collect();
    assert_eq!(keys, vec!["zeta", "alpha", "empty", "text", "specials", "rgb", "nested"]);
}
