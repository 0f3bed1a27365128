// Quill - A small blog CMS built with Rust
// Copyright (C) 2025 Quill Project Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use std::path::Path;

use crate::autoreload_templates::TemplateEngine;

/// Create the templates directory, write any missing default template and
/// load the engine.
pub fn init_templates(templates_dir: &str, development_mode: bool) -> Result<TemplateEngine> {
    std::fs::create_dir_all(templates_dir).context("Failed to create templates directory")?;

    create_default_templates(templates_dir)?;

    TemplateEngine::new(templates_dir, development_mode)
}

fn create_default_templates(templates_dir: &str) -> Result<()> {
    let base_dir = Path::new(templates_dir);

    for (name, body) in DEFAULT_TEMPLATES {
        let path = base_dir.join(name);
        if !path.exists() {
            std::fs::write(&path, body)
                .with_context(|| format!("Failed to create template {}", name))?;
        }
    }

    Ok(())
}

pub const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("base.html", BASE_TEMPLATE),
    ("setup.html", SETUP_TEMPLATE),
    ("login.html", LOGIN_TEMPLATE),
    ("dashboard.html", DASHBOARD_TEMPLATE),
    ("api-key.html", API_KEY_TEMPLATE),
    ("create-user.html", CREATE_USER_TEMPLATE),
    ("list-users.html", LIST_USERS_TEMPLATE),
    ("update-user.html", UPDATE_USER_TEMPLATE),
    ("delete-user.html", DELETE_USER_TEMPLATE),
    ("post-editor.html", POST_EDITOR_TEMPLATE),
    ("list-posts.html", LIST_POSTS_TEMPLATE),
];

const BASE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{% block title %}Quill{% endblock %}</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.6;
            max-width: 800px;
            margin: 0 auto;
            padding: 20px;
            color: #333;
        }
        nav {
            border-bottom: 1px solid #eee;
            padding-bottom: 10px;
            margin-bottom: 20px;
        }
        nav a {
            margin-right: 15px;
            text-decoration: none;
            color: #0066cc;
        }
        nav a:hover {
            text-decoration: underline;
        }
        .auth-info {
            float: right;
            font-size: 0.9em;
        }
        .error { color: #b00020; }
        .success { color: #2e7d32; }
        label { display: block; margin-top: 10px; }
        input[type=text], input[type=password], textarea { width: 100%; padding: 5px; }
        table { width: 100%; border-collapse: collapse; }
        th, td { text-align: left; padding: 4px 8px; border-bottom: 1px solid #eee; }
    </style>
    {% block head %}{% endblock %}
</head>
<body>
    <nav>
        {% if current_user %}
            <a href="/">Dashboard</a>
            <a href="/create-post">New post</a>
            <a href="/list-posts">Posts</a>
            <a href="/api-key">API key</a>
            {% if current_user.is_admin %}
                <a href="/create-user">Create user</a>
                <a href="/list-users">Users</a>
            {% endif %}
            <span class="auth-info">
                {{ current_user.username }} |
                <a href="/logout">Logout</a>
            </span>
        {% else %}
            <span class="auth-info">
                <a href="/login">Login</a>
            </span>
        {% endif %}
    </nav>

    <main>
        {% if error %}
        <p class="error">{{ error }}</p>
        {% endif %}
        {% if validation_errors %}
        <ul class="error">
            {% for message in validation_errors %}
            <li>{{ message }}</li>
            {% endfor %}
        </ul>
        {% endif %}
        {% if success_message %}
        <p class="success">{{ success_message }}</p>
        {% endif %}

        {% block content %}{% endblock %}
    </main>
</body>
</html>"#;

const SETUP_TEMPLATE: &str = r#"{% extends "base.html" %}

{% block title %}Setup - {{ super() }}{% endblock %}

{% block content %}
<h1>Welcome to Quill</h1>
<p>Create the administrator account to finish setting up.</p>

<form method="post" action="/setup">
    <label for="username">Username</label>
    <input type="text" id="username" name="username" value="{{ form.username | default(value='') }}" required>

    <label for="password">Password</label>
    <input type="password" id="password" name="password" required>

    <p><button type="submit">Create administrator</button></p>
</form>
{% endblock %}"#;

const LOGIN_TEMPLATE: &str = r#"{% extends "base.html" %}

{% block title %}Login - {{ super() }}{% endblock %}

{% block content %}
<h1>Login</h1>

<form method="post" action="/login">
    <label for="username">Username</label>
    <input type="text" id="username" name="username" value="{{ form.username | default(value='') }}" required>

    <label for="password">Password</label>
    <input type="password" id="password" name="password" required>

    <p><button type="submit">Login</button></p>
</form>
{% endblock %}"#;

const DASHBOARD_TEMPLATE: &str = r#"{% extends "base.html" %}

{% block title %}Dashboard - {{ super() }}{% endblock %}

{% block content %}
<h1>Dashboard</h1>
{% if current_user %}
<p>Logged in as <strong>{{ current_user.username }}</strong>{% if current_user.is_admin %} (administrator){% endif %}.</p>
{% endif %}

<ul>
    <li><a href="/create-post">Write a new post</a></li>
    <li><a href="/list-posts">Your posts</a></li>
    <li><a href="/api-key">Your API key</a></li>
    <li><a href="/update-user">Update account</a></li>
    <li><a href="/delete-user">Delete account</a></li>
    {% if current_user and current_user.is_admin %}
    <li><a href="/create-user">Create a user</a></li>
    <li><a href="/list-users">List users</a></li>
    {% endif %}
</ul>
{% endblock %}"#;

const API_KEY_TEMPLATE: &str = r#"{% extends "base.html" %}

{% block title %}API key - {{ super() }}{% endblock %}

{% block content %}
<h1>Your API credentials</h1>
<p>Send both values with every API request in the <code>X-Api-Key</code> and <code>X-Api-Secret</code> headers.</p>

<label for="api-key">API key</label>
<input type="text" id="api-key" value="{{ api_key }}" readonly>
<button type="button" data-copy-target="api-key">Copy</button>

<label for="api-secret">API secret</label>
<input type="text" id="api-secret" value="{{ api_secret }}" readonly>
<button type="button" data-copy-target="api-secret">Copy</button>

<script src="/static/js/copy-text.js"></script>

<p>New credentials can be issued from the <a href="/update-user">account page</a>.</p>
{% endblock %}"#;

const CREATE_USER_TEMPLATE: &str = r#"{% extends "base.html" %}

{% block title %}Create user - {{ super() }}{% endblock %}

{% block content %}
<h1>Create a user</h1>

<form method="post" action="/create-user">
    <label for="username">Username</label>
    <input type="text" id="username" name="username" value="{{ form.username | default(value='') }}" required>

    <label for="password">Password</label>
    <input type="password" id="password" name="password" required>

    <label><input type="checkbox" name="admin" value="true"> Administrator</label>

    <p><button type="submit">Create user</button></p>
</form>
{% endblock %}"#;

const LIST_USERS_TEMPLATE: &str = r#"{% extends "base.html" %}

{% block title %}Users - {{ super() }}{% endblock %}

{% block content %}
<h1>Users</h1>

<table>
    <thead>
        <tr><th>Username</th><th>Role</th><th>Posts</th></tr>
    </thead>
    <tbody>
    {% for user in users %}
        <tr>
            <td>{{ user.name }}</td>
            <td>{% if user.is_admin %}Administrator{% else %}Writer{% endif %}</td>
            <td><a href="/list-posts?username={{ user.name | urlencode }}">View</a></td>
        </tr>
    {% endfor %}
    </tbody>
</table>
{% endblock %}"#;

const UPDATE_USER_TEMPLATE: &str = r#"{% extends "base.html" %}

{% block title %}Update account - {{ super() }}{% endblock %}

{% block content %}
<h1>Update account</h1>

<form method="post" action="/update-user">
    {% if current_user and current_user.is_admin %}
    <label for="old_username">Account to update (leave empty for your own)</label>
    <input type="text" id="old_username" name="old_username" value="{{ form.old_username | default(value='') }}">

    <label for="admin">Administrator status</label>
    <select id="admin" name="admin">
        <option value="">Unchanged</option>
        <option value="true">Administrator</option>
        <option value="false">Writer</option>
    </select>
    {% endif %}

    <label for="new_username">New username</label>
    <input type="text" id="new_username" name="new_username" value="{{ form.new_username | default(value='') }}">

    <label for="new_password">New password</label>
    <input type="password" id="new_password" name="new_password">

    <label><input type="checkbox" name="new_keys" value="on"> Issue new API credentials</label>

    <p><button type="submit">Update</button></p>
</form>
{% endblock %}"#;

const DELETE_USER_TEMPLATE: &str = r#"{% extends "base.html" %}

{% block title %}Delete account - {{ super() }}{% endblock %}

{% block content %}
<h1>Delete account</h1>

<form method="post" action="/delete-user">
    {% if current_user and current_user.is_admin %}
    <p>Administrators can delete any writer account. To delete your own account, give up administrator status first.</p>
    <label for="username">Username</label>
    <input type="text" id="username" name="username" value="{{ form.username | default(value='') }}" required>
    {% else %}
    <p>This permanently deletes your account. Your posts are kept.</p>
    {% endif %}

    <p><button type="submit">Delete</button></p>
</form>
{% endblock %}"#;

const POST_EDITOR_TEMPLATE: &str = r#"{% extends "base.html" %}

{% block title %}{% if form.id is defined %}Edit post{% else %}New post{% endif %} - {{ super() }}{% endblock %}

{% block content %}
{% if form.id is defined %}
<h1>Edit post</h1>
{% if post is defined %}
<p>
    By {{ post.author }}, posted {{ post.postedOn }}.
    {% if post.updatedOn %}Last updated {{ post.updatedOn }} by {{ post.updatedBy }}.{% endif %}
</p>
{% endif %}
<form method="post" action="/edit-post/{{ form.id }}">
{% else %}
<h1>New post</h1>
<form method="post" action="/create-post">
{% endif %}
    <label for="title">Title</label>
    <input type="text" id="title" name="title" value="{{ form.title | default(value='') }}" required>

    <label for="body">Body (Markdown)</label>
    <textarea id="body" name="body" rows="16" required>{{ form.body | default(value='') }}</textarea>

    <p><button type="submit">Save</button></p>
</form>

{% if form.id is defined %}
<form method="post" action="/delete-post/{{ form.id }}">
    <button type="submit">Delete post</button>
</form>
{% endif %}

{% if form.body is defined and form.body %}
<h2>Preview</h2>
<article>{{ form.body | markdown | safe }}</article>
{% endif %}
{% endblock %}"#;

const LIST_POSTS_TEMPLATE: &str = r#"{% extends "base.html" %}

{% block title %}Posts - {{ super() }}{% endblock %}

{% block content %}
<h1>Posts by {{ username }}</h1>

{% if posts %}
<table>
    <thead>
        <tr><th>Title</th><th>Posted</th><th>Updated</th></tr>
    </thead>
    <tbody>
    {% for post in posts %}
        <tr>
            <td><a href="/post/{{ post.id }}">{{ post.title }}</a></td>
            <td>{{ post.postedOn }}</td>
            <td>{% if post.updatedOn %}{{ post.updatedOn }} by {{ post.updatedBy }}{% endif %}</td>
        </tr>
    {% endfor %}
    </tbody>
</table>
{% else %}
<p>No posts yet.</p>
{% endif %}

<p>
    {% if not first_page %}
    <a href="/list-posts?username={{ username | urlencode }}&page={{ page - 1 }}">Newer</a>
    {% endif %}
    Page {{ page }}
    {% if not last_page %}
    <a href="/list-posts?username={{ username | urlencode }}&page={{ page + 1 }}">Older</a>
    {% endif %}
</p>
{% endblock %}"#;
