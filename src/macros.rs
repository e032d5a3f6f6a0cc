/// Builds a [`Node`](crate::Node) tree inline.
///
/// Keys are not checked here; writing the node to a [`Document`](crate::Document)
/// or [`FileStorage`](crate::FileStorage) validates them.
///
/// Negative numbers inside `[...]` or `{...}` need parentheses, e.g. `[(-1), 2]`.
#[macro_export]
macro_rules! node {
    // Empty node
    (null) => {
        $crate::Node::None
    };

    ([]) => {
        $crate::Node::Seq(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Node::Seq(vec![$($crate::node!($elem)),*])
    };

    ({}) => {
        $crate::Node::Map($crate::NodeMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut map = $crate::NodeMap::new();
        $(
            map.insert($key.to_string(), $crate::node!($value));
        )*
        $crate::Node::Map(map)
    }};

    // Scalars, matrices and anything else with a `From` conversion
    ($e:expr) => {
        $crate::Node::from($e)
    };
}
