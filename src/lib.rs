/*!
```console
             _
 _ ____   _(_) _____      __
| '_ \ \ / / |/ _ \ \ /\ / /
| | | \ V /| |  __/\ V  V /
|_| |_|\_/ |_|\___| \_/\_/
```

Strided N-dimensional arrays: borrowed views, an owning container, and
aliasing-safe elementwise operations between them.

Dimension 0 varies fastest in memory. Views are cheap handles over someone
else's elements; binding and slicing them never allocates. Operations that
combine two handles detect overlapping memory and go through a temporary
copy when needed, so assigning a transposed view of an array into itself
does what it says.
*/

mod core;

pub use crate::core::*;
