//! Built-in identifier → import path table.
//!
//! Keys are the names snippets use to qualify package members. Where two
//! standard packages share a base name (`math/rand` and `crypto/rand`), the
//! more common one wins; the other is reachable through the overlay.

pub(crate) const BUILTIN_IMPORTS: &[(&str, &str)] = &[
    // Third-party shell scripting helpers, installed by --setup
    ("script", "github.com/bitfield/script"),
    // Formatting and IO
    ("fmt", "fmt"),
    ("io", "io"),
    ("bufio", "bufio"),
    ("bytes", "bytes"),
    ("os", "os"),
    ("exec", "os/exec"),
    ("signal", "os/signal"),
    ("user", "os/user"),
    ("log", "log"),
    ("slog", "log/slog"),
    ("flag", "flag"),
    ("fs", "io/fs"),
    ("ioutil", "io/ioutil"),
    // Text
    ("strings", "strings"),
    ("strconv", "strconv"),
    ("unicode", "unicode"),
    ("utf8", "unicode/utf8"),
    ("regexp", "regexp"),
    ("template", "text/template"),
    ("tabwriter", "text/tabwriter"),
    ("scanner", "text/scanner"),
    ("html", "html"),
    // Paths and time
    ("path", "path"),
    ("filepath", "path/filepath"),
    ("time", "time"),
    // Collections and algorithms
    ("sort", "sort"),
    ("slices", "slices"),
    ("maps", "maps"),
    ("cmp", "cmp"),
    ("list", "container/list"),
    ("heap", "container/heap"),
    ("ring", "container/ring"),
    // Numbers
    ("math", "math"),
    ("rand", "math/rand"),
    ("big", "math/big"),
    ("bits", "math/bits"),
    ("cmplx", "math/cmplx"),
    // Encoding
    ("json", "encoding/json"),
    ("csv", "encoding/csv"),
    ("xml", "encoding/xml"),
    ("base64", "encoding/base64"),
    ("hex", "encoding/hex"),
    ("binary", "encoding/binary"),
    ("pem", "encoding/pem"),
    // Compression and archives
    ("gzip", "compress/gzip"),
    ("zlib", "compress/zlib"),
    ("tar", "archive/tar"),
    ("zip", "archive/zip"),
    // Hashing and crypto
    ("md5", "crypto/md5"),
    ("sha1", "crypto/sha1"),
    ("sha256", "crypto/sha256"),
    ("sha512", "crypto/sha512"),
    ("hmac", "crypto/hmac"),
    ("tls", "crypto/tls"),
    ("crc32", "hash/crc32"),
    ("fnv", "hash/fnv"),
    // Networking
    ("net", "net"),
    ("http", "net/http"),
    ("url", "net/url"),
    ("mail", "net/mail"),
    ("smtp", "net/smtp"),
    ("httputil", "net/http/httputil"),
    // Concurrency and runtime
    ("sync", "sync"),
    ("atomic", "sync/atomic"),
    ("context", "context"),
    ("runtime", "runtime"),
    ("debug", "runtime/debug"),
    ("errors", "errors"),
    ("reflect", "reflect"),
    ("embed", "embed"),
    ("sql", "database/sql"),
];
